//! Versioned symptom rulesets.
//!
//! A [`Ruleset`] bundles everything the scorer needs: weighted symptom phrases, weighted
//! severity modifiers, emergency phrases with their bonus, and the tier thresholds.
//!
//! ## Built-in versions
//!
//! The weights evolved over three drafts of the intake rules. They are kept side by side so a
//! deployment can pin an older behaviour and so stored explanations stay reproducible:
//!
//! - `v1`: flat weights (5 for high-risk phrases, 3 for moderate, 1 for mild). No severity
//!   weighting and no emergency phrases. MODERATE at 4, HIGH at 8.
//! - `v2`: per-phrase weights ("unconscious" 10, "high fever" 5, ...). "severe" and
//!   "persistent" each add 2. MODERATE at 6, HIGH at 12.
//! - `v3` (default): the v2 table extended with the bare forms ("fever", "cough",
//!   "headache"), a wider set of severity modifiers, and emergency phrases worth 15 points
//!   each that force HIGH. MODERATE at 10, HIGH at 20.
//!
//! ## Custom rulesets
//!
//! [`Ruleset::from_yaml`] loads a ruleset from YAML. Phrases are matched against lowercased
//! input, so they must be written in lowercase; anything else could never match and is
//! rejected at load time.

use crate::constants::DEFAULT_RULESET_VERSION;
use crate::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

/// One weighted phrase of a lexicon table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LexiconEntry {
    pub phrase: String,
    pub weight: u32,
}

impl LexiconEntry {
    fn from_static(table: &[(&str, u32)]) -> Vec<Self> {
        table
            .iter()
            .map(|(phrase, weight)| Self {
                phrase: (*phrase).to_owned(),
                weight: *weight,
            })
            .collect()
    }
}

/// Minimum scores for the MODERATE and HIGH tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Thresholds {
    pub moderate: u32,
    pub high: u32,
}

/// An immutable, validated scoring ruleset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruleset {
    pub(crate) version: String,
    pub(crate) provenance: String,
    pub(crate) symptoms: Vec<LexiconEntry>,
    pub(crate) severity_modifiers: Vec<LexiconEntry>,
    pub(crate) emergency_phrases: Vec<String>,
    pub(crate) emergency_bonus: u32,
    pub(crate) thresholds: Thresholds,
}

/// YAML shape of a ruleset file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesetWire {
    version: String,
    #[serde(default)]
    provenance: String,
    symptoms: Vec<LexiconEntry>,
    #[serde(default)]
    severity_modifiers: Vec<LexiconEntry>,
    #[serde(default)]
    emergency_phrases: Vec<String>,
    #[serde(default)]
    emergency_bonus: u32,
    thresholds: Thresholds,
}

const V1_SYMPTOMS: &[(&str, u32)] = &[
    ("chest pain", 5),
    ("breathlessness", 5),
    ("unconscious", 5),
    ("blood", 5),
    ("seizure", 5),
    ("fever", 3),
    ("cough", 3),
    ("vomiting", 3),
    ("diarrhea", 3),
    ("severe headache", 3),
    ("fatigue", 1),
    ("cold", 1),
    ("sore throat", 1),
    ("body pain", 1),
];

const V2_SYMPTOMS: &[(&str, u32)] = &[
    ("chest pain", 8),
    ("breathlessness", 8),
    ("unconscious", 10),
    ("seizure", 9),
    ("blood vomiting", 9),
    ("stroke", 10),
    ("high fever", 5),
    ("persistent cough", 5),
    ("vomiting", 4),
    ("diarrhea", 4),
    ("severe headache", 5),
    ("abdominal pain", 5),
    ("cold", 1),
    ("fatigue", 2),
    ("sore throat", 2),
    ("body pain", 2),
    ("mild fever", 2),
];

const V2_SEVERITY: &[(&str, u32)] = &[("severe", 2), ("persistent", 2)];

const V3_SYMPTOMS: &[(&str, u32)] = &[
    ("chest pain", 8),
    ("breathlessness", 8),
    ("unconscious", 10),
    ("seizure", 9),
    ("blood vomiting", 9),
    ("stroke", 10),
    ("high fever", 5),
    ("persistent cough", 5),
    ("vomiting", 4),
    ("diarrhea", 4),
    ("severe headache", 5),
    ("abdominal pain", 5),
    ("dizziness", 3),
    ("fever", 3),
    ("cough", 2),
    ("headache", 2),
    ("rash", 2),
    ("cold", 1),
    ("fatigue", 2),
    ("sore throat", 2),
    ("body pain", 2),
    ("mild fever", 2),
];

const V3_SEVERITY: &[(&str, u32)] = &[
    ("severe", 3),
    ("persistent", 2),
    ("extreme", 4),
    ("unbearable", 4),
    ("worsening", 2),
    ("sudden", 2),
];

const V3_EMERGENCY: &[&str] = &[
    "cannot breathe",
    "can't breathe",
    "not breathing",
    "unresponsive",
    "heavy bleeding",
    "coughing blood",
    "fainted",
    "suicidal",
];

/// Emergency bonus added per matched emergency phrase in `v3`.
pub const V3_EMERGENCY_BONUS: u32 = 15;

static BUILTIN_RULESETS: LazyLock<Vec<Arc<Ruleset>>> = LazyLock::new(|| {
    vec![
        Arc::new(Ruleset {
            version: "v1".into(),
            provenance: "First intake draft: flat 5/3/1 weights by risk band.".into(),
            symptoms: LexiconEntry::from_static(V1_SYMPTOMS),
            severity_modifiers: Vec::new(),
            emergency_phrases: Vec::new(),
            emergency_bonus: 0,
            thresholds: Thresholds {
                moderate: 4,
                high: 8,
            },
        }),
        Arc::new(Ruleset {
            version: "v2".into(),
            provenance: "Per-phrase weights with severe/persistent modifiers.".into(),
            symptoms: LexiconEntry::from_static(V2_SYMPTOMS),
            severity_modifiers: LexiconEntry::from_static(V2_SEVERITY),
            emergency_phrases: Vec::new(),
            emergency_bonus: 0,
            thresholds: Thresholds {
                moderate: 6,
                high: 12,
            },
        }),
        Arc::new(Ruleset {
            version: "v3".into(),
            provenance: "v2 weights plus bare symptom forms, graded severity modifiers \
                         and emergency phrases that force HIGH."
                .into(),
            symptoms: LexiconEntry::from_static(V3_SYMPTOMS),
            severity_modifiers: LexiconEntry::from_static(V3_SEVERITY),
            emergency_phrases: V3_EMERGENCY.iter().map(|p| (*p).to_owned()).collect(),
            emergency_bonus: V3_EMERGENCY_BONUS,
            thresholds: Thresholds {
                moderate: 10,
                high: 20,
            },
        }),
    ]
});

impl Ruleset {
    /// Returns the built-in ruleset with the given version label.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidInput`] if no built-in ruleset has that version.
    pub fn builtin(version: &str) -> TriageResult<Arc<Ruleset>> {
        let version = version.trim();
        BUILTIN_RULESETS
            .iter()
            .find(|r| r.version == version)
            .cloned()
            .ok_or_else(|| {
                TriageError::InvalidInput(format!(
                    "unknown ruleset version '{version}' (known: {})",
                    Self::builtin_versions().collect::<Vec<_>>().join(", ")
                ))
            })
    }

    pub fn builtin_versions() -> impl Iterator<Item = &'static str> {
        BUILTIN_RULESETS.iter().map(|r| r.version.as_str())
    }

    /// The default (latest) built-in ruleset.
    pub fn current() -> Arc<Ruleset> {
        BUILTIN_RULESETS
            .iter()
            .find(|r| r.version == DEFAULT_RULESET_VERSION)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&BUILTIN_RULESETS[BUILTIN_RULESETS.len() - 1]))
    }

    /// Parse and validate a ruleset from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::RulesetParse`] if the YAML does not match the ruleset schema
    /// (unknown keys included), and [`TriageError::InvalidInput`] if the tables are invalid:
    /// an empty or non-lowercase phrase, a duplicate phrase within one table, or a MODERATE
    /// threshold that is not below the HIGH threshold.
    pub fn from_yaml(yaml_text: &str) -> TriageResult<Ruleset> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, RulesetWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                return Err(TriageError::RulesetParse {
                    path: if path.is_empty() || path == "." {
                        "<root>".into()
                    } else {
                        path
                    },
                    message: source.to_string(),
                });
            }
        };

        let ruleset = Ruleset {
            version: wire.version.trim().to_owned(),
            provenance: wire.provenance,
            symptoms: wire.symptoms,
            severity_modifiers: wire.severity_modifiers,
            emergency_phrases: wire.emergency_phrases,
            emergency_bonus: wire.emergency_bonus,
            thresholds: wire.thresholds,
        };
        ruleset.validate()?;
        Ok(ruleset)
    }

    /// Render this ruleset in the YAML shape accepted by [`Ruleset::from_yaml`].
    pub fn to_yaml(&self) -> TriageResult<String> {
        let wire = RulesetWire {
            version: self.version.clone(),
            provenance: self.provenance.clone(),
            symptoms: self.symptoms.clone(),
            severity_modifiers: self.severity_modifiers.clone(),
            emergency_phrases: self.emergency_phrases.clone(),
            emergency_bonus: self.emergency_bonus,
            thresholds: self.thresholds,
        };
        serde_yaml::to_string(&wire).map_err(|e| TriageError::RulesetParse {
            path: "<root>".into(),
            message: e.to_string(),
        })
    }

    fn validate(&self) -> TriageResult<()> {
        if self.version.is_empty() {
            return Err(TriageError::InvalidInput(
                "ruleset version cannot be empty".into(),
            ));
        }
        if self.thresholds.moderate >= self.thresholds.high {
            return Err(TriageError::InvalidInput(format!(
                "moderate threshold ({}) must be below high threshold ({})",
                self.thresholds.moderate, self.thresholds.high
            )));
        }

        check_phrases("symptoms", self.symptoms.iter().map(|e| e.phrase.as_str()))?;
        check_phrases(
            "severity_modifiers",
            self.severity_modifiers.iter().map(|e| e.phrase.as_str()),
        )?;
        check_phrases(
            "emergency_phrases",
            self.emergency_phrases.iter().map(String::as_str),
        )
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn provenance(&self) -> &str {
        &self.provenance
    }

    pub fn symptoms(&self) -> &[LexiconEntry] {
        &self.symptoms
    }

    pub fn severity_modifiers(&self) -> &[LexiconEntry] {
        &self.severity_modifiers
    }

    pub fn emergency_phrases(&self) -> &[String] {
        &self.emergency_phrases
    }

    pub fn emergency_bonus(&self) -> u32 {
        self.emergency_bonus
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }
}

fn check_phrases<'a>(table: &str, phrases: impl Iterator<Item = &'a str>) -> TriageResult<()> {
    let mut seen = HashSet::new();
    for phrase in phrases {
        if phrase.trim().is_empty() {
            return Err(TriageError::InvalidInput(format!(
                "{table}: phrases cannot be empty"
            )));
        }
        if phrase != phrase.to_lowercase() {
            return Err(TriageError::InvalidInput(format!(
                "{table}: phrase '{phrase}' must be lowercase"
            )));
        }
        if !seen.insert(phrase) {
            return Err(TriageError::InvalidInput(format!(
                "{table}: duplicate phrase '{phrase}'"
            )));
        }
    }
    Ok(())
}
