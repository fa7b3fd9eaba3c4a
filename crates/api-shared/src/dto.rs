//! Request and response bodies exchanged over the APIs.
//!
//! Tiers travel as their labels (`LOW`, `MODERATE`, `HIGH`) and timestamps as RFC 3339
//! strings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use triage_core::{
    AnalyticsSummary, CaseFilter, CaseView, Explanation, LexiconEntry, OverrideAck,
    OverrideRecord, RiskTier, Ruleset, ScoreResult, SubjectRef, TriageError, TriageResult,
};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitCaseReq {
    /// Free-text symptom description. Required; missing or blank is rejected.
    #[serde(default)]
    pub text: Option<String>,
    /// Location tag, e.g. a village name. Defaults to "Unknown".
    #[serde(default)]
    pub location: Option<String>,
    /// Reviewers only: submit on behalf of this subject.
    #[serde(default)]
    pub subject_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScoreReq {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExplanationRes {
    pub ruleset_version: String,
    pub detected_symptoms: Vec<String>,
    pub detected_severity_words: Vec<String>,
    pub emergency_phrases: Vec<String>,
    pub severity: String,
    pub duration: String,
    pub location: String,
    pub symptom_points: u32,
    pub severity_points: u32,
    pub emergency_points: u32,
    pub reasoning: String,
}

impl From<&Explanation> for ExplanationRes {
    fn from(e: &Explanation) -> Self {
        Self {
            ruleset_version: e.ruleset_version.clone(),
            detected_symptoms: e.detected_symptoms.clone(),
            detected_severity_words: e.detected_severity_words.clone(),
            emergency_phrases: e.emergency_phrases.clone(),
            severity: match e.severity {
                triage_core::SeverityLabel::Normal => "normal".into(),
                triage_core::SeverityLabel::High => "high".into(),
            },
            duration: e.duration.clone(),
            location: e.location.to_string(),
            symptom_points: e.symptom_points,
            severity_points: e.severity_points,
            emergency_points: e.emergency_points,
            reasoning: e.reasoning.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoreRes {
    pub risk_tier: String,
    pub recommendation: String,
    pub score: u32,
    pub emergency_flag: bool,
    pub duration: String,
    pub detected_symptoms: Vec<String>,
    pub detected_severity_words: Vec<String>,
    pub explanation: ExplanationRes,
}

impl From<&ScoreResult> for ScoreRes {
    fn from(r: &ScoreResult) -> Self {
        Self {
            risk_tier: r.risk_tier.to_string(),
            recommendation: triage_core::recommendation_text(r.risk_tier).into(),
            score: r.score,
            emergency_flag: r.emergency_flag,
            duration: r.duration.clone(),
            detected_symptoms: r.detected_symptoms.clone(),
            detected_severity_words: r.detected_severity_words.clone(),
            explanation: (&r.explanation).into(),
        }
    }
}

/// Reviewer-only part of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaseDetailRes {
    pub subject_ref: String,
    pub raw_text: String,
    pub score: u32,
    pub score_result: ScoreRes,
    pub doctor_override: Option<String>,
}

/// A case as seen by the caller. `detail` is omitted entirely for reporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaseRes {
    pub case_id: String,
    pub risk_tier: String,
    pub recommendation: String,
    pub location: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<CaseDetailRes>,
}

impl From<&CaseView> for CaseRes {
    fn from(view: &CaseView) -> Self {
        Self {
            case_id: view.case_id.to_string(),
            risk_tier: view.risk_tier.to_string(),
            recommendation: view.recommendation.clone(),
            location: view.location.to_string(),
            created_at: view.created_at.to_rfc3339(),
            detail: view.detail.as_ref().map(|d| CaseDetailRes {
                subject_ref: d.subject_ref.to_string(),
                raw_text: d.raw_text.clone(),
                score: d.score_result.score,
                score_result: (&d.score_result).into(),
                doctor_override: d.doctor_override.map(|t| t.to_string()),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListCasesRes {
    pub cases: Vec<CaseRes>,
}

impl ListCasesRes {
    pub fn from_views(views: &[CaseView]) -> Self {
        Self {
            cases: views.iter().map(CaseRes::from).collect(),
        }
    }
}

/// Query filter for listing all cases.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCasesQuery {
    /// Scored tier: LOW, MODERATE or HIGH.
    pub risk_tier: Option<String>,
    pub location: Option<String>,
    pub subject_ref: Option<String>,
    /// Only cases with (true) or without (false) a doctor override.
    pub overridden: Option<bool>,
}

impl ListCasesQuery {
    pub fn into_filter(self) -> TriageResult<CaseFilter> {
        Ok(CaseFilter {
            risk_tier: self
                .risk_tier
                .as_deref()
                .map(str::parse::<RiskTier>)
                .transpose()?,
            location: self.location.filter(|l| !l.trim().is_empty()),
            subject: self
                .subject_ref
                .filter(|s| !s.trim().is_empty())
                .map(SubjectRef::new)
                .transpose()
                .map_err(TriageError::from)?,
            overridden: self.overridden,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OverrideCaseReq {
    /// LOW, MODERATE or HIGH.
    pub risk_tier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OverrideCaseRes {
    pub case_id: String,
    pub risk_tier: String,
    pub previous_override: Option<String>,
    pub recorded_at: String,
}

impl From<&OverrideAck> for OverrideCaseRes {
    fn from(ack: &OverrideAck) -> Self {
        Self {
            case_id: ack.case_id.to_string(),
            risk_tier: ack.risk_tier.to_string(),
            previous_override: ack.previous_override.map(|t| t.to_string()),
            recorded_at: ack.recorded_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OverrideRecordRes {
    pub case_id: String,
    pub risk_tier: String,
    pub previous_override: Option<String>,
    pub reviewer: String,
    pub recorded_at: String,
}

impl From<&OverrideRecord> for OverrideRecordRes {
    fn from(record: &OverrideRecord) -> Self {
        Self {
            case_id: record.case_id.to_string(),
            risk_tier: record.tier.to_string(),
            previous_override: record.previous.map(|t| t.to_string()),
            reviewer: record.reviewer.to_string(),
            recorded_at: record.recorded_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListOverridesRes {
    pub overrides: Vec<OverrideRecordRes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsRes {
    pub risk_distribution: BTreeMap<String, usize>,
    pub location_distribution: BTreeMap<String, usize>,
    pub override_distribution: BTreeMap<String, usize>,
    pub total_cases: usize,
}

impl From<&AnalyticsSummary> for AnalyticsRes {
    fn from(summary: &AnalyticsSummary) -> Self {
        let by_label = |m: &BTreeMap<RiskTier, usize>| {
            m.iter()
                .map(|(tier, n)| (tier.to_string(), *n))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            risk_distribution: by_label(&summary.risk_distribution),
            location_distribution: summary.location_distribution.clone(),
            override_distribution: by_label(&summary.override_distribution),
            total_cases: summary.total_cases,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LexiconEntryRes {
    pub phrase: String,
    pub weight: u32,
}

impl From<&LexiconEntry> for LexiconEntryRes {
    fn from(entry: &LexiconEntry) -> Self {
        Self {
            phrase: entry.phrase.clone(),
            weight: entry.weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RulesetRes {
    pub version: String,
    pub provenance: String,
    pub symptoms: Vec<LexiconEntryRes>,
    pub severity_modifiers: Vec<LexiconEntryRes>,
    pub emergency_phrases: Vec<String>,
    pub emergency_bonus: u32,
    pub moderate_threshold: u32,
    pub high_threshold: u32,
}

impl From<&Ruleset> for RulesetRes {
    fn from(ruleset: &Ruleset) -> Self {
        Self {
            version: ruleset.version().into(),
            provenance: ruleset.provenance().into(),
            symptoms: ruleset.symptoms().iter().map(Into::into).collect(),
            severity_modifiers: ruleset.severity_modifiers().iter().map(Into::into).collect(),
            emergency_phrases: ruleset.emergency_phrases().to_vec(),
            emergency_bonus: ruleset.emergency_bonus(),
            moderate_threshold: ruleset.thresholds().moderate,
            high_threshold: ruleset.thresholds().high,
        }
    }
}
