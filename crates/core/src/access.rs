//! Role-based access policy.
//!
//! Every boundary operation checks a [`Capability`] against the caller's [`Role`] and returns
//! cases only through [`AccessPolicy::project`], so redaction is decided in one place.
//!
//! | Capability        | Reporter | Reviewer |
//! |-------------------|----------|----------|
//! | `SubmitOwnCase`   | yes      | yes      |
//! | `SubmitOnBehalf`  |          | yes      |
//! | `ListOwnCases`    | yes      | yes      |
//! | `ListAllCases`    |          | yes      |
//! | `ViewScoreDetail` |          | yes      |
//! | `OverrideCase`    |          | yes      |
//! | `ViewAnalytics`   |          | yes      |
//! | `PreviewScore`    |          | yes      |
//! | `ViewRuleset`     |          | yes      |

use crate::case::Case;
use crate::scorer::ScoreResult;
use crate::tier::RiskTier;
use crate::{TriageError, TriageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use triage_types::{Location, SubjectRef};
use triage_uuid::CaseId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Patient-equivalent: submits and follows their own cases.
    Reporter,
    /// Clinician-equivalent: reviews all cases, overrides tiers, reads analytics.
    Reviewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Reporter => f.write_str("reporter"),
            Role::Reviewer => f.write_str("reviewer"),
        }
    }
}

impl FromStr for Role {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reporter" | "patient" => Ok(Role::Reporter),
            "reviewer" | "clinician" | "doctor" => Ok(Role::Reviewer),
            other => Err(TriageError::InvalidInput(format!("unknown role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    SubmitOwnCase,
    SubmitOnBehalf,
    ListOwnCases,
    ListAllCases,
    ViewScoreDetail,
    OverrideCase,
    ViewAnalytics,
    PreviewScore,
    ViewRuleset,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Capability::SubmitOwnCase => "submit cases",
            Capability::SubmitOnBehalf => "submit cases on behalf of others",
            Capability::ListOwnCases => "list their own cases",
            Capability::ListAllCases => "list all cases",
            Capability::ViewScoreDetail => "view score detail",
            Capability::OverrideCase => "override case tiers",
            Capability::ViewAnalytics => "view analytics",
            Capability::PreviewScore => "preview scores",
            Capability::ViewRuleset => "view the ruleset",
        };
        f.write_str(text)
    }
}

const REPORTER_CAPABILITIES: &[Capability] =
    &[Capability::SubmitOwnCase, Capability::ListOwnCases];

const REVIEWER_CAPABILITIES: &[Capability] = &[
    Capability::SubmitOwnCase,
    Capability::SubmitOnBehalf,
    Capability::ListOwnCases,
    Capability::ListAllCases,
    Capability::ViewScoreDetail,
    Capability::OverrideCase,
    Capability::ViewAnalytics,
    Capability::PreviewScore,
    Capability::ViewRuleset,
];

/// An authenticated caller. Authentication itself happens outside the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub subject: SubjectRef,
    pub role: Role,
}

impl Actor {
    pub fn new(subject: SubjectRef, role: Role) -> Self {
        Self { subject, role }
    }
}

/// Patient-facing advice for a tier.
pub fn recommendation_text(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::High => "seek immediate in-person care",
        RiskTier::Moderate => "consult within 24\u{2013}48 hours",
        RiskTier::Low => "rest and self-monitor.",
    }
}

/// Fields only reviewers may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDetail {
    pub subject_ref: SubjectRef,
    pub raw_text: String,
    pub score_result: ScoreResult,
    pub doctor_override: Option<RiskTier>,
}

/// A case as returned across the boundary.
///
/// `detail` is `None` for reporters and is skipped when serialised, so a reporter view never
/// carries a score, detected symptoms or an explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseView {
    pub case_id: CaseId,
    pub risk_tier: RiskTier,
    pub recommendation: String,
    pub location: Location,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<CaseDetail>,
}

pub struct AccessPolicy;

impl AccessPolicy {
    pub fn capabilities(role: Role) -> &'static [Capability] {
        match role {
            Role::Reporter => REPORTER_CAPABILITIES,
            Role::Reviewer => REVIEWER_CAPABILITIES,
        }
    }

    pub fn allows(role: Role, capability: Capability) -> bool {
        Self::capabilities(role).contains(&capability)
    }

    /// # Errors
    ///
    /// Returns [`TriageError::Unauthorized`] if the actor's role lacks `capability`.
    pub fn require(actor: &Actor, capability: Capability) -> TriageResult<()> {
        if Self::allows(actor.role, capability) {
            return Ok(());
        }
        tracing::warn!(
            "denied: {} {} attempted to {}",
            actor.role,
            actor.subject,
            capability
        );
        Err(TriageError::Unauthorized {
            role: actor.role,
            capability,
        })
    }

    /// Project a case into the view the role is allowed to see.
    pub fn project(role: Role, case: &Case) -> CaseView {
        let risk_tier = case.risk_tier();
        let detail = Self::allows(role, Capability::ViewScoreDetail).then(|| CaseDetail {
            subject_ref: case.subject_ref().clone(),
            raw_text: case.raw_text().to_owned(),
            score_result: case.score_result().clone(),
            doctor_override: case.doctor_override(),
        });

        CaseView {
            case_id: case.id(),
            risk_tier,
            recommendation: recommendation_text(risk_tier).to_owned(),
            location: case.location().clone(),
            created_at: case.created_at(),
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::Scorer;
    use crate::store::CaseStore;
    use std::sync::Arc;

    fn actor(role: Role) -> Actor {
        Actor::new(SubjectRef::new("someone").unwrap(), role)
    }

    #[test]
    fn recommendation_text_is_exact() {
        assert_eq!(
            recommendation_text(RiskTier::High),
            "seek immediate in-person care"
        );
        assert_eq!(
            recommendation_text(RiskTier::Moderate),
            "consult within 24–48 hours"
        );
        assert_eq!(recommendation_text(RiskTier::Low), "rest and self-monitor.");
    }

    #[test]
    fn reporters_cannot_review_override_or_read_analytics() {
        let reporter = actor(Role::Reporter);
        assert!(AccessPolicy::require(&reporter, Capability::SubmitOwnCase).is_ok());
        assert!(AccessPolicy::require(&reporter, Capability::ListOwnCases).is_ok());
        for capability in [
            Capability::SubmitOnBehalf,
            Capability::ListAllCases,
            Capability::ViewScoreDetail,
            Capability::OverrideCase,
            Capability::ViewAnalytics,
            Capability::PreviewScore,
            Capability::ViewRuleset,
        ] {
            let err = AccessPolicy::require(&reporter, capability).unwrap_err();
            assert!(matches!(
                err,
                TriageError::Unauthorized { role: Role::Reporter, capability: c } if c == capability
            ));
        }
    }

    #[test]
    fn reviewers_hold_every_capability() {
        for capability in REVIEWER_CAPABILITIES {
            assert!(AccessPolicy::allows(Role::Reviewer, *capability));
        }
    }

    #[test]
    fn reporter_projection_hides_score_and_explanation() {
        let store = CaseStore::in_memory(Arc::new(Scorer::default()));
        let case = store
            .create(SubjectRef::new("p1").unwrap(), "high fever", None)
            .unwrap();

        let view = AccessPolicy::project(Role::Reporter, &case);
        assert!(view.detail.is_none());
        let json = serde_json::to_value(&view).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert!(!keys.contains(&"detail"));
        assert!(!json.to_string().contains("score"));
        assert!(!json.to_string().contains("explanation"));
        assert_eq!(json["risk_tier"], "LOW");
        assert_eq!(json["recommendation"], "rest and self-monitor.");
    }

    #[test]
    fn reviewer_projection_carries_full_detail() {
        let store = CaseStore::in_memory(Arc::new(Scorer::default()));
        let case = store
            .create(SubjectRef::new("p1").unwrap(), "stroke", Some("Rampur"))
            .unwrap();

        let view = AccessPolicy::project(Role::Reviewer, &case);
        let detail = view.detail.expect("reviewer should see detail");
        assert_eq!(detail.score_result.score, 10);
        assert_eq!(detail.raw_text, "stroke");
        assert_eq!(view.risk_tier, RiskTier::Moderate);
        assert_eq!(view.recommendation, "consult within 24–48 hours");
    }

    #[test]
    fn role_parsing_accepts_aliases() {
        assert_eq!("Patient".parse::<Role>().unwrap(), Role::Reporter);
        assert_eq!("doctor".parse::<Role>().unwrap(), Role::Reviewer);
        assert!("admin".parse::<Role>().is_err());
    }
}
