use crate::access::{Capability, Role};
use triage_uuid::CaseId;

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("case not found: {0}")]
    NotFound(CaseId),
    #[error("{role} is not permitted to {capability}")]
    Unauthorized { role: Role, capability: Capability },

    #[error("case id already exists: {0}")]
    DuplicateCaseId(CaseId),
    #[error("case store lock poisoned")]
    LockPoisoned,

    #[error("failed to create data directory: {0}")]
    DataDirCreation(std::io::Error),
    #[error("failed to open case journal: {0}")]
    JournalOpen(std::io::Error),
    #[error("failed to read case journal: {0}")]
    JournalRead(std::io::Error),
    #[error("failed to write case journal: {0}")]
    JournalWrite(std::io::Error),
    #[error("case journal could not be restored after a failed write; restart required")]
    JournalUnavailable,
    #[error("failed to serialize journal entry: {0}")]
    Serialization(serde_json::Error),
    #[error("case journal is corrupt at line {line}: {source}")]
    JournalCorrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("case journal is inconsistent at line {line}: {reason}")]
    JournalInconsistent { line: usize, reason: String },

    #[error("failed to read ruleset file: {0}")]
    RulesetRead(std::io::Error),
    #[error("failed to parse ruleset YAML at {path}: {message}")]
    RulesetParse { path: String, message: String },
}

impl From<triage_types::TextError> for TriageError {
    fn from(e: triage_types::TextError) -> Self {
        TriageError::InvalidInput(e.to_string())
    }
}

impl From<triage_uuid::UuidError> for TriageError {
    fn from(e: triage_uuid::UuidError) -> Self {
        TriageError::InvalidInput(e.to_string())
    }
}

pub type TriageResult<T> = std::result::Result<T, TriageError>;
