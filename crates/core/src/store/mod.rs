//! Case storage.
//!
//! [`CaseStore`] is the append/lookup API the rest of the system uses. It scores text with
//! its [`Scorer`] and hands fully built cases to a pluggable [`CaseBackend`]:
//!
//! - [`InMemoryBackend`]: process-local, used by tests and throwaway deployments.
//! - [`JournalBackend`]: append-only JSON-lines journal under a data directory, replayed on
//!   open.
//!
//! Backends keep cases in insertion order and never overwrite an existing id. A case is
//! constructed completely before it is handed to a backend, so concurrent readers see either
//! the whole case or nothing.

pub mod journal;
pub mod memory;

pub use journal::JournalBackend;
pub use memory::InMemoryBackend;

use crate::case::{Case, OverrideRecord};
use crate::scorer::Scorer;
use crate::tier::RiskTier;
use crate::{TriageError, TriageResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use triage_types::{Location, SubjectRef};
use triage_uuid::CaseId;

/// Storage backing for cases and their override history.
pub trait CaseBackend: Send + Sync {
    /// Append a new case. Fails with [`TriageError::DuplicateCaseId`] if the id is taken.
    fn insert(&self, case: Case) -> TriageResult<()>;

    fn get(&self, id: &CaseId) -> TriageResult<Case>;

    fn list_by_subject(&self, subject: &SubjectRef) -> TriageResult<Vec<Case>>;

    fn list_all(&self) -> TriageResult<Vec<Case>>;

    /// Set the doctor override of an existing case. Last write wins.
    fn set_override(
        &self,
        id: &CaseId,
        tier: RiskTier,
        reviewer: &SubjectRef,
    ) -> TriageResult<OverrideRecord>;

    fn override_history(&self) -> TriageResult<Vec<OverrideRecord>>;
}

/// In-memory case table shared by the backends.
#[derive(Debug, Default)]
pub(crate) struct CaseTable {
    cases: Vec<Case>,
    index: HashMap<CaseId, usize>,
    overrides: Vec<OverrideRecord>,
}

impl CaseTable {
    pub(crate) fn check_insert(&self, case: &Case) -> TriageResult<()> {
        if self.index.contains_key(&case.id()) {
            return Err(TriageError::DuplicateCaseId(case.id()));
        }
        Ok(())
    }

    /// Callers must have run [`CaseTable::check_insert`] first.
    pub(crate) fn push(&mut self, case: Case) {
        self.index.insert(case.id(), self.cases.len());
        self.cases.push(case);
    }

    pub(crate) fn get(&self, id: &CaseId) -> TriageResult<Case> {
        self.index
            .get(id)
            .map(|&i| self.cases[i].clone())
            .ok_or(TriageError::NotFound(*id))
    }

    pub(crate) fn list_by_subject(&self, subject: &SubjectRef) -> Vec<Case> {
        self.cases
            .iter()
            .filter(|c| c.subject_ref() == subject)
            .cloned()
            .collect()
    }

    pub(crate) fn list_all(&self) -> Vec<Case> {
        self.cases.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.cases.len()
    }

    pub(crate) fn prepare_override(
        &self,
        id: &CaseId,
        tier: RiskTier,
        reviewer: &SubjectRef,
    ) -> TriageResult<OverrideRecord> {
        let &i = self.index.get(id).ok_or(TriageError::NotFound(*id))?;
        Ok(OverrideRecord {
            case_id: *id,
            tier,
            previous: self.cases[i].doctor_override(),
            reviewer: reviewer.clone(),
            recorded_at: Utc::now(),
        })
    }

    pub(crate) fn apply_override(&mut self, record: OverrideRecord) -> TriageResult<()> {
        let &i = self
            .index
            .get(&record.case_id)
            .ok_or(TriageError::NotFound(record.case_id))?;
        self.cases[i].set_override(record.tier);
        self.overrides.push(record);
        Ok(())
    }

    pub(crate) fn override_history(&self) -> Vec<OverrideRecord> {
        self.overrides.clone()
    }
}

/// Scores submissions and stores them as cases.
#[derive(Clone)]
pub struct CaseStore {
    backend: Arc<dyn CaseBackend>,
    scorer: Arc<Scorer>,
}

impl CaseStore {
    pub fn new(backend: Arc<dyn CaseBackend>, scorer: Arc<Scorer>) -> Self {
        Self { backend, scorer }
    }

    pub fn in_memory(scorer: Arc<Scorer>) -> Self {
        Self::new(Arc::new(InMemoryBackend::default()), scorer)
    }

    pub fn scorer(&self) -> &Arc<Scorer> {
        &self.scorer
    }

    /// Score `text` and append the resulting case.
    ///
    /// The store does not reject empty text; that is enforced at the service boundary.
    pub fn create(
        &self,
        subject_ref: SubjectRef,
        text: &str,
        location: Option<&str>,
    ) -> TriageResult<Case> {
        let score_result = self.scorer.evaluate(text, location);
        let case = Case::new(
            subject_ref,
            text.to_owned(),
            Location::resolve(location),
            score_result,
        );
        self.backend.insert(case.clone())?;
        Ok(case)
    }

    pub fn get(&self, id: &CaseId) -> TriageResult<Case> {
        self.backend.get(id)
    }

    pub fn list_by_subject(&self, subject: &SubjectRef) -> TriageResult<Vec<Case>> {
        self.backend.list_by_subject(subject)
    }

    pub fn list_all(&self) -> TriageResult<Vec<Case>> {
        self.backend.list_all()
    }

    /// Record a doctor override. The caller is responsible for authorisation.
    pub fn set_override(
        &self,
        id: &CaseId,
        tier: RiskTier,
        reviewer: &SubjectRef,
    ) -> TriageResult<OverrideRecord> {
        self.backend.set_override(id, tier, reviewer)
    }

    pub fn override_history(&self) -> TriageResult<Vec<OverrideRecord>> {
        self.backend.override_history()
    }
}
