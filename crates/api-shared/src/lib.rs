//! # API Shared
//!
//! Shared utilities and definitions for the triage APIs.
//!
//! Contains:
//! - Transport types (`dto` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//! - Header-based actor authentication
//!
//! Used by `api-rest` and the runner binary.

pub mod auth;
pub mod dto;
pub mod health;

pub use health::HealthService;
