//! Boundary operations.
//!
//! [`TriageService`] is what transports (REST, CLI) call. Each operation checks the access
//! policy first, validates input, and returns cases only as role-appropriate
//! [`CaseView`]s.

use crate::access::{AccessPolicy, Actor, Capability, CaseView, Role};
use crate::aggregator::{summarize, AnalyticsSummary};
use crate::case::{Case, OverrideRecord};
use crate::lexicon::Ruleset;
use crate::scorer::ScoreResult;
use crate::store::CaseStore;
use crate::tier::RiskTier;
use crate::{TriageError, TriageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use triage_types::{NonEmptyText, SubjectRef};
use triage_uuid::CaseId;

/// Optional narrowing for [`TriageService::review_cases`]. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFilter {
    /// Matches the scored tier, not the override.
    pub risk_tier: Option<RiskTier>,
    pub location: Option<String>,
    pub subject: Option<SubjectRef>,
    pub overridden: Option<bool>,
}

impl CaseFilter {
    pub fn matches(&self, case: &Case) -> bool {
        self.risk_tier.is_none_or(|tier| case.risk_tier() == tier)
            && self
                .location
                .as_deref()
                .is_none_or(|loc| case.location().as_str() == loc)
            && self
                .subject
                .as_ref()
                .is_none_or(|subject| case.subject_ref() == subject)
            && self
                .overridden
                .is_none_or(|wanted| case.doctor_override().is_some() == wanted)
    }
}

/// Acknowledgement of a recorded override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideAck {
    pub case_id: CaseId,
    pub risk_tier: RiskTier,
    pub previous_override: Option<RiskTier>,
    pub recorded_at: DateTime<Utc>,
}

impl From<OverrideRecord> for OverrideAck {
    fn from(record: OverrideRecord) -> Self {
        Self {
            case_id: record.case_id,
            risk_tier: record.tier,
            previous_override: record.previous,
            recorded_at: record.recorded_at,
        }
    }
}

#[derive(Clone)]
pub struct TriageService {
    store: CaseStore,
}

impl TriageService {
    pub fn new(store: CaseStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CaseStore {
        &self.store
    }

    /// Score and store a submission.
    ///
    /// `subject` defaults to the actor. Reporters may only submit for themselves; reviewers
    /// may submit on behalf of another subject.
    ///
    /// # Errors
    ///
    /// - [`TriageError::InvalidInput`] if `text` is empty or whitespace.
    /// - [`TriageError::Unauthorized`] if a reporter names another subject.
    pub fn submit_case(
        &self,
        actor: &Actor,
        subject: Option<SubjectRef>,
        text: &str,
        location: Option<&str>,
    ) -> TriageResult<CaseView> {
        AccessPolicy::require(actor, Capability::SubmitOwnCase)?;
        let subject = match subject {
            Some(subject) if subject != actor.subject => {
                AccessPolicy::require(actor, Capability::SubmitOnBehalf)?;
                subject
            }
            _ => actor.subject.clone(),
        };

        NonEmptyText::new(text)
            .map_err(|_| TriageError::InvalidInput("symptom text is required".into()))?;

        let case = self.store.create(subject, text, location)?;
        tracing::info!(
            case_id = %case.id(),
            risk_tier = %case.risk_tier(),
            emergency = case.score_result().emergency_flag,
            "case submitted"
        );
        Ok(AccessPolicy::project(actor.role, &case))
    }

    /// The actor's own cases, oldest first.
    pub fn my_cases(&self, actor: &Actor) -> TriageResult<Vec<CaseView>> {
        AccessPolicy::require(actor, Capability::ListOwnCases)?;
        Ok(self.project_all(actor.role, self.store.list_by_subject(&actor.subject)?))
    }

    /// All cases matching `filter`, oldest first.
    pub fn review_cases(&self, actor: &Actor, filter: &CaseFilter) -> TriageResult<Vec<CaseView>> {
        AccessPolicy::require(actor, Capability::ListAllCases)?;
        let cases = self
            .store
            .list_all()?
            .into_iter()
            .filter(|case| filter.matches(case))
            .collect();
        Ok(self.project_all(actor.role, cases))
    }

    /// A single case. Reporters only see their own; anyone else's case reads as not found.
    pub fn get_case(&self, actor: &Actor, id: &CaseId) -> TriageResult<CaseView> {
        let case = self.store.get(id)?;
        if !AccessPolicy::allows(actor.role, Capability::ListAllCases)
            && case.subject_ref() != &actor.subject
        {
            return Err(TriageError::NotFound(*id));
        }
        Ok(AccessPolicy::project(actor.role, &case))
    }

    pub fn override_case(
        &self,
        actor: &Actor,
        id: &CaseId,
        tier: RiskTier,
    ) -> TriageResult<OverrideAck> {
        AccessPolicy::require(actor, Capability::OverrideCase)?;
        let record = self.store.set_override(id, tier, &actor.subject)?;
        tracing::info!(
            case_id = %id,
            risk_tier = %tier,
            reviewer = %actor.subject,
            "override recorded"
        );
        Ok(record.into())
    }

    pub fn override_history(&self, actor: &Actor) -> TriageResult<Vec<OverrideRecord>> {
        AccessPolicy::require(actor, Capability::OverrideCase)?;
        self.store.override_history()
    }

    pub fn analytics(&self, actor: &Actor) -> TriageResult<AnalyticsSummary> {
        AccessPolicy::require(actor, Capability::ViewAnalytics)?;
        Ok(summarize(&self.store.list_all()?))
    }

    /// Score text without storing a case.
    pub fn preview_score(
        &self,
        actor: &Actor,
        text: &str,
        location: Option<&str>,
    ) -> TriageResult<ScoreResult> {
        AccessPolicy::require(actor, Capability::PreviewScore)?;
        Ok(self.store.scorer().evaluate(text, location))
    }

    pub fn ruleset(&self, actor: &Actor) -> TriageResult<Arc<Ruleset>> {
        AccessPolicy::require(actor, Capability::ViewRuleset)?;
        Ok(Arc::clone(self.store.scorer().ruleset()))
    }

    fn project_all(&self, role: Role, cases: Vec<Case>) -> Vec<CaseView> {
        cases
            .iter()
            .map(|case| AccessPolicy::project(role, case))
            .collect()
    }
}
