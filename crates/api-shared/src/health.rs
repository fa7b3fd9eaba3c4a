use crate::dto::HealthRes;

/// Health check shared by every transport.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Returns a `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Triage service is alive".into(),
        }
    }
}
