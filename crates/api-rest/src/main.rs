//! Standalone REST API server binary.
//!
//! Useful during development when only the REST server (with OpenAPI/Swagger UI) is wanted.
//! The workspace's `triage-run` binary is the usual entry point and additionally loads `.env`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triage_core::config::{data_dir_from_env_value, ruleset_from_env_values};
use triage_core::CoreConfig;

/// Starts the REST API on `TRIAGE_REST_ADDR` (default: 0.0.0.0:3000).
///
/// # Errors
/// Returns an error if:
/// - `API_KEY` is unset or blank,
/// - the ruleset or data directory cannot be loaded, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("triage_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("TRIAGE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let api_key = std::env::var("API_KEY").unwrap_or_default();
    if api_key.trim().is_empty() {
        anyhow::bail!("API_KEY must be set");
    }

    let ruleset = ruleset_from_env_values(
        std::env::var("TRIAGE_RULESET").ok(),
        std::env::var("TRIAGE_RULESET_FILE").ok(),
    )?;
    let cfg = CoreConfig::new(
        data_dir_from_env_value(std::env::var("TRIAGE_DATA_DIR").ok()),
        ruleset,
    )?;

    tracing::info!("-- Starting triage REST API on {}", addr);
    let app = api_rest::router(api_rest::AppState::new(cfg.build_service()?, api_key));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
