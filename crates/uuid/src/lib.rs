//! Case identifiers.
//!
//! Every triage case is identified by a random (v4) UUID held in a *canonical* text form:
//! **32 lowercase hexadecimal characters** (no hyphens), e.g.
//! `550e8400e29b41d4a716446655440000`.
//!
//! Identifiers arriving from outside the core (REST paths, CLI arguments) must already be
//! canonical; [`CaseId::parse`] rejects uppercase, hyphenated or truncated values rather than
//! normalising them, so a case is only ever addressed by one spelling.

mod service;

pub use service::{CaseId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
