//! Caller identification from request metadata.
//!
//! Login, sessions and password handling belong to the surrounding system. By the time a
//! request reaches the triage API it carries:
//!
//! - `x-api-key`: the shared key proving the request came through the trusted front end
//! - `x-actor-id`: the authenticated user's opaque reference
//! - `x-actor-role`: `reporter` or `reviewer` (missing means `reporter`)

use triage_core::{Actor, Role, SubjectRef};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("invalid API key")]
    InvalidApiKey,
    #[error("missing actor id")]
    MissingActor,
    #[error("invalid actor role: {0}")]
    InvalidRole(String),
}

/// Validates the provided API key against the key configured at startup.
pub fn validate_api_key(provided_key: Option<&str>, expected_key: &str) -> Result<(), AuthError> {
    match provided_key {
        None => Err(AuthError::MissingApiKey),
        Some(key) if key == expected_key => Ok(()),
        Some(_) => Err(AuthError::InvalidApiKey),
    }
}

/// Resolve the calling actor from header values.
pub fn resolve_actor(
    provided_key: Option<&str>,
    expected_key: &str,
    actor_id: Option<&str>,
    role: Option<&str>,
) -> Result<Actor, AuthError> {
    validate_api_key(provided_key, expected_key)?;

    let subject = actor_id
        .and_then(|id| SubjectRef::new(id).ok())
        .ok_or(AuthError::MissingActor)?;

    let role = match role.map(str::trim).filter(|r| !r.is_empty()) {
        None => Role::Reporter,
        Some(r) => r
            .parse::<Role>()
            .map_err(|_| AuthError::InvalidRole(r.to_owned()))?,
    };

    Ok(Actor::new(subject, role))
}
