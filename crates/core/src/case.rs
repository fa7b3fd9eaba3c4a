use crate::scorer::ScoreResult;
use crate::tier::RiskTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use triage_types::{Location, SubjectRef};
use triage_uuid::CaseId;

/// A scored triage submission.
///
/// A case only exists once its text has been fully scored. After creation the only field
/// that can change is the doctor override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    id: CaseId,
    subject_ref: SubjectRef,
    raw_text: String,
    location: Location,
    score_result: ScoreResult,
    doctor_override: Option<RiskTier>,
    created_at: DateTime<Utc>,
}

impl Case {
    pub(crate) fn new(
        subject_ref: SubjectRef,
        raw_text: String,
        location: Location,
        score_result: ScoreResult,
    ) -> Self {
        Self {
            id: CaseId::new(),
            subject_ref,
            raw_text,
            location,
            score_result,
            doctor_override: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> CaseId {
        self.id
    }

    pub fn subject_ref(&self) -> &SubjectRef {
        &self.subject_ref
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn score_result(&self) -> &ScoreResult {
        &self.score_result
    }

    /// Tier assigned by the scorer. Never changed by overrides.
    pub fn risk_tier(&self) -> RiskTier {
        self.score_result.risk_tier
    }

    pub fn doctor_override(&self) -> Option<RiskTier> {
        self.doctor_override
    }

    /// Override if a clinician set one, otherwise the scored tier.
    pub fn effective_tier(&self) -> RiskTier {
        self.doctor_override.unwrap_or(self.score_result.risk_tier)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn set_override(&mut self, tier: RiskTier) -> Option<RiskTier> {
        self.doctor_override.replace(tier)
    }
}

/// One doctor override, kept as an audit trail alongside the case itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub case_id: CaseId,
    pub tier: RiskTier,
    pub previous: Option<RiskTier>,
    pub reviewer: SubjectRef,
    pub recorded_at: DateTime<Utc>,
}
