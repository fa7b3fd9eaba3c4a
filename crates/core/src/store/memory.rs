use super::{CaseBackend, CaseTable};
use crate::case::{Case, OverrideRecord};
use crate::tier::RiskTier;
use crate::{TriageError, TriageResult};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use triage_types::SubjectRef;
use triage_uuid::CaseId;

/// Process-local backend. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    table: RwLock<CaseTable>,
}

impl InMemoryBackend {
    fn read(&self) -> TriageResult<RwLockReadGuard<'_, CaseTable>> {
        self.table.read().map_err(|_| TriageError::LockPoisoned)
    }

    fn write(&self) -> TriageResult<RwLockWriteGuard<'_, CaseTable>> {
        self.table.write().map_err(|_| TriageError::LockPoisoned)
    }
}

impl CaseBackend for InMemoryBackend {
    fn insert(&self, case: Case) -> TriageResult<()> {
        let mut table = self.write()?;
        table.check_insert(&case)?;
        table.push(case);
        Ok(())
    }

    fn get(&self, id: &CaseId) -> TriageResult<Case> {
        self.read()?.get(id)
    }

    fn list_by_subject(&self, subject: &SubjectRef) -> TriageResult<Vec<Case>> {
        Ok(self.read()?.list_by_subject(subject))
    }

    fn list_all(&self) -> TriageResult<Vec<Case>> {
        Ok(self.read()?.list_all())
    }

    fn set_override(
        &self,
        id: &CaseId,
        tier: RiskTier,
        reviewer: &SubjectRef,
    ) -> TriageResult<OverrideRecord> {
        let mut table = self.write()?;
        let record = table.prepare_override(id, tier, reviewer)?;
        table.apply_override(record.clone())?;
        Ok(record)
    }

    fn override_history(&self) -> TriageResult<Vec<OverrideRecord>> {
        Ok(self.read()?.override_history())
    }
}
