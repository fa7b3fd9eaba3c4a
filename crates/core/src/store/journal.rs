//! Durable case backend.
//!
//! Every mutation is appended as one JSON object per line to `cases.jsonl` in the data
//! directory and only then applied to the in-memory table:
//!
//! ```text
//! {"event":"case_created","case":{...}}
//! {"event":"override_recorded","record":{...}}
//! ```
//!
//! On open the journal is replayed from the top, so file order is insertion order. A line
//! that does not parse, a repeated case id, or an override for an unknown case stops the
//! replay with an error naming the 1-based line number.
//!
//! A failed append (short write, failed sync) is cut back to the previous file length, so
//! the journal never holds an entry the caller was told had failed. If the cut itself
//! fails the backend refuses further writes until it is reopened.

use super::{CaseBackend, CaseTable};
use crate::case::{Case, OverrideRecord};
use crate::constants::CASE_JOURNAL_FILENAME;
use crate::tier::RiskTier;
use crate::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use triage_types::SubjectRef;
use triage_uuid::CaseId;

#[derive(Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum JournalEntry {
    CaseCreated { case: Case },
    OverrideRecorded { record: OverrideRecord },
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum JournalEntryRef<'a> {
    CaseCreated { case: &'a Case },
    OverrideRecorded { record: &'a OverrideRecord },
}

/// File operations an append needs, so rollback can be exercised without a real disk fault.
trait JournalFile: Write {
    fn len(&self) -> io::Result<u64>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl JournalFile for File {
    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

#[derive(Debug)]
enum AppendFailure {
    /// The file is back at its previous length.
    RolledBack(io::Error),
    /// The file may still hold a partial line.
    Unrecoverable(io::Error),
}

/// Append one complete line and sync it, or leave the file as it was.
fn append_line<F: JournalFile>(file: &mut F, line: &[u8]) -> Result<(), AppendFailure> {
    let start = file.len().map_err(AppendFailure::RolledBack)?;
    let written = file.write_all(line).and_then(|()| file.sync());
    match written {
        Ok(()) => Ok(()),
        Err(e) => match file.truncate(start).and_then(|()| file.sync()) {
            Ok(()) => Err(AppendFailure::RolledBack(e)),
            Err(_) => Err(AppendFailure::Unrecoverable(e)),
        },
    }
}

struct JournalState {
    table: CaseTable,
    file: File,
    failed: bool,
}

impl JournalState {
    fn append(&mut self, entry: &JournalEntryRef<'_>) -> TriageResult<()> {
        if self.failed {
            return Err(TriageError::JournalUnavailable);
        }

        let mut line = serde_json::to_string(entry).map_err(TriageError::Serialization)?;
        line.push('\n');
        match append_line(&mut self.file, line.as_bytes()) {
            Ok(()) => Ok(()),
            Err(AppendFailure::RolledBack(e)) => {
                tracing::warn!("journal append rolled back: {}", e);
                Err(TriageError::JournalWrite(e))
            }
            Err(AppendFailure::Unrecoverable(e)) => {
                tracing::error!("journal append failed and could not be rolled back: {}", e);
                self.failed = true;
                Err(TriageError::JournalWrite(e))
            }
        }
    }
}

/// Append-only JSON-lines backend.
pub struct JournalBackend {
    path: PathBuf,
    state: RwLock<JournalState>,
}

impl JournalBackend {
    /// Open (or create) the journal inside `data_dir`, replaying any existing entries.
    ///
    /// # Errors
    ///
    /// - [`TriageError::DataDirCreation`] if `data_dir` cannot be created.
    /// - [`TriageError::JournalRead`] / [`TriageError::JournalOpen`] on I/O failure.
    /// - [`TriageError::JournalCorrupt`] / [`TriageError::JournalInconsistent`] if replay fails.
    pub fn open(data_dir: &Path) -> TriageResult<Self> {
        fs::create_dir_all(data_dir).map_err(TriageError::DataDirCreation)?;
        let path = data_dir.join(CASE_JOURNAL_FILENAME);

        let table = if path.is_file() {
            let contents = fs::read_to_string(&path).map_err(TriageError::JournalRead)?;
            replay(&contents)?
        } else {
            CaseTable::default()
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(TriageError::JournalOpen)?;

        tracing::info!(
            "opened case journal {} ({} cases)",
            path.display(),
            table.len()
        );

        Ok(Self {
            path,
            state: RwLock::new(JournalState {
                table,
                file,
                failed: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> TriageResult<RwLockReadGuard<'_, JournalState>> {
        self.state.read().map_err(|_| TriageError::LockPoisoned)
    }

    fn write(&self) -> TriageResult<RwLockWriteGuard<'_, JournalState>> {
        self.state.write().map_err(|_| TriageError::LockPoisoned)
    }
}

fn replay(contents: &str) -> TriageResult<CaseTable> {
    let mut table = CaseTable::default();

    for (i, line) in contents.lines().enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }

        let entry: JournalEntry =
            serde_json::from_str(line).map_err(|source| TriageError::JournalCorrupt {
                line: line_no,
                source,
            })?;

        match entry {
            JournalEntry::CaseCreated { case } => {
                table
                    .check_insert(&case)
                    .map_err(|e| TriageError::JournalInconsistent {
                        line: line_no,
                        reason: e.to_string(),
                    })?;
                table.push(case);
            }
            JournalEntry::OverrideRecorded { record } => {
                table
                    .apply_override(record)
                    .map_err(|e| TriageError::JournalInconsistent {
                        line: line_no,
                        reason: e.to_string(),
                    })?;
            }
        }
    }

    Ok(table)
}

impl CaseBackend for JournalBackend {
    fn insert(&self, case: Case) -> TriageResult<()> {
        let mut state = self.write()?;
        state.table.check_insert(&case)?;
        state.append(&JournalEntryRef::CaseCreated { case: &case })?;
        state.table.push(case);
        Ok(())
    }

    fn get(&self, id: &CaseId) -> TriageResult<Case> {
        self.read()?.table.get(id)
    }

    fn list_by_subject(&self, subject: &SubjectRef) -> TriageResult<Vec<Case>> {
        Ok(self.read()?.table.list_by_subject(subject))
    }

    fn list_all(&self) -> TriageResult<Vec<Case>> {
        Ok(self.read()?.table.list_all())
    }

    fn set_override(
        &self,
        id: &CaseId,
        tier: RiskTier,
        reviewer: &SubjectRef,
    ) -> TriageResult<OverrideRecord> {
        let mut state = self.write()?;
        let record = state.table.prepare_override(id, tier, reviewer)?;
        state.append(&JournalEntryRef::OverrideRecorded { record: &record })?;
        state.table.apply_override(record.clone())?;
        Ok(record)
    }

    fn override_history(&self) -> TriageResult<Vec<OverrideRecord>> {
        Ok(self.read()?.table.override_history())
    }
}
