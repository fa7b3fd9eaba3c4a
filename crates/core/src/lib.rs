//! # Triage Core
//!
//! Decision logic and bookkeeping for symptom triage:
//! - [`lexicon`]: versioned weighted phrase tables and tier thresholds
//! - [`scorer`]: deterministic substring scoring into a [`RiskTier`]
//! - [`store`]: case storage with pluggable in-memory and journal backends
//! - [`aggregator`]: risk and location distributions
//! - [`access`]: role capabilities and redacted case views
//! - [`service`]: the boundary operations transports call
//!
//! **No transport concerns**: HTTP, authentication and presentation live in `api-shared`,
//! `api-rest` and the CLI.

pub mod access;
pub mod aggregator;
pub mod case;
pub mod config;
pub mod constants;
pub mod error;
pub mod lexicon;
pub mod scorer;
pub mod service;
pub mod store;
pub mod tier;

pub use access::{recommendation_text, AccessPolicy, Actor, Capability, CaseDetail, CaseView, Role};
pub use aggregator::{summarize, AnalyticsSummary};
pub use case::{Case, OverrideRecord};
pub use config::CoreConfig;
pub use error::{TriageError, TriageResult};
pub use lexicon::{LexiconEntry, Ruleset, Thresholds};
pub use scorer::{Explanation, ScoreResult, Scorer, SeverityLabel};
pub use service::{CaseFilter, OverrideAck, TriageService};
pub use store::{CaseBackend, CaseStore, InMemoryBackend, JournalBackend};
pub use tier::RiskTier;

pub use triage_types::{Location, NonEmptyText, SubjectRef};
pub use triage_uuid::CaseId;
