//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the core. Request
//! handling never reads environment variables, which keeps behaviour consistent across
//! threads and test harnesses.

use crate::constants::DEFAULT_RULESET_VERSION;
use crate::lexicon::Ruleset;
use crate::scorer::Scorer;
use crate::service::TriageService;
use crate::store::{CaseStore, JournalBackend};
use crate::{TriageError, TriageResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: Option<PathBuf>,
    ruleset: Arc<Ruleset>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `data_dir` selects the durable journal backend; `None` keeps cases in memory only.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidInput`] if `data_dir` exists but is not a directory.
    pub fn new(data_dir: Option<PathBuf>, ruleset: Arc<Ruleset>) -> TriageResult<Self> {
        if let Some(dir) = &data_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(TriageError::InvalidInput(format!(
                    "data directory is not a directory: {}",
                    dir.display()
                )));
            }
        }

        Ok(Self { data_dir, ruleset })
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn ruleset(&self) -> &Arc<Ruleset> {
        &self.ruleset
    }

    /// Build the case store described by this configuration.
    pub fn build_store(&self) -> TriageResult<CaseStore> {
        let scorer = Arc::new(Scorer::new(Arc::clone(&self.ruleset)));
        match &self.data_dir {
            Some(dir) => {
                let backend = JournalBackend::open(dir)?;
                Ok(CaseStore::new(Arc::new(backend), scorer))
            }
            None => {
                tracing::warn!("no data directory configured; cases are kept in memory only");
                Ok(CaseStore::in_memory(scorer))
            }
        }
    }

    pub fn build_service(&self) -> TriageResult<TriageService> {
        Ok(TriageService::new(self.build_store()?))
    }
}

/// Resolve the data directory from an optional string value. Blank means in-memory.
pub fn data_dir_from_env_value(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Resolve the scoring ruleset from optional version and file values.
///
/// A ruleset file takes precedence over a version label. With neither set (or both blank)
/// the default built-in ruleset is used.
pub fn ruleset_from_env_values(
    version: Option<String>,
    file: Option<String>,
) -> TriageResult<Arc<Ruleset>> {
    let file = file
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if let Some(file) = file {
        let yaml = std::fs::read_to_string(&file).map_err(TriageError::RulesetRead)?;
        let ruleset = Ruleset::from_yaml(&yaml)?;
        tracing::info!("loaded ruleset {} from {}", ruleset.version(), file);
        return Ok(Arc::new(ruleset));
    }

    let version = version
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_RULESET_VERSION.to_string());
    Ruleset::builtin(&version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn ruleset_defaults_to_current() {
        assert_eq!(ruleset_from_env_values(None, None).unwrap().version(), "v3");
        assert_eq!(
            ruleset_from_env_values(Some("  ".into()), Some("".into()))
                .unwrap()
                .version(),
            "v3"
        );
        assert_eq!(
            ruleset_from_env_values(Some("v2".into()), None)
                .unwrap()
                .version(),
            "v2"
        );
        assert!(ruleset_from_env_values(Some("v0".into()), None).is_err());
    }

    #[test]
    fn ruleset_file_wins_over_version() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("ruleset.yaml");
        fs::write(
            &path,
            "version: clinic\nsymptoms:\n  - phrase: fever\n    weight: 7\nthresholds:\n  moderate: 5\n  high: 10\n",
        )
        .unwrap();

        let ruleset =
            ruleset_from_env_values(Some("v1".into()), Some(path.display().to_string())).unwrap();
        assert_eq!(ruleset.version(), "clinic");

        let missing = temp_dir.path().join("missing.yaml");
        assert!(matches!(
            ruleset_from_env_values(None, Some(missing.display().to_string())),
            Err(TriageError::RulesetRead(_))
        ));
    }

    #[test]
    fn data_dir_blank_means_memory() {
        assert_eq!(data_dir_from_env_value(None), None);
        assert_eq!(data_dir_from_env_value(Some(" ".into())), None);
        assert_eq!(
            data_dir_from_env_value(Some("/var/triage".into())),
            Some(PathBuf::from("/var/triage"))
        );
    }

    #[test]
    fn data_dir_must_not_be_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file = temp_dir.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();
        assert!(CoreConfig::new(Some(file), Ruleset::current()).is_err());
    }

    #[test]
    fn journal_config_builds_durable_service() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = CoreConfig::new(Some(temp_dir.path().to_path_buf()), Ruleset::current())
            .expect("CoreConfig::new should succeed");
        let service = cfg.build_service().unwrap();
        service
            .store()
            .create(triage_types::SubjectRef::new("p1").unwrap(), "cough", None)
            .unwrap();
        assert!(temp_dir.path().join("cases.jsonl").is_file());
    }
}
