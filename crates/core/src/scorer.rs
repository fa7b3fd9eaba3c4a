//! Keyword-weighted symptom scoring.
//!
//! The scorer is a pure function of its ruleset and input text: it lowercases the text and
//! then tests every lexicon phrase for *substring* containment. There is no tokenisation and
//! no word-boundary check, so overlapping entries are each counted. With the `v3` ruleset
//! "high fever" scores both "high fever" (5) and "fever" (3). Negations are not understood
//! either: "no fever" still detects "fever".

use crate::constants::{DURATION_NOT_SPECIFIED, DURATION_PATTERN, SCORING_REASONING};
use crate::lexicon::{Ruleset, Thresholds};
use crate::tier::RiskTier;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use triage_types::Location;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DURATION_PATTERN).expect("duration pattern is a valid regex"));

/// Coarse severity label recorded in the explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLabel {
    Normal,
    High,
}

/// Audit record of how a score was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub ruleset_version: String,
    pub detected_symptoms: Vec<String>,
    pub detected_severity_words: Vec<String>,
    pub emergency_phrases: Vec<String>,
    pub severity: SeverityLabel,
    pub duration: String,
    pub location: Location,
    pub symptom_points: u32,
    pub severity_points: u32,
    pub emergency_points: u32,
    pub reasoning: String,
}

/// Output of a single evaluation.
///
/// Detected phrases are unique and listed in ruleset table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub detected_symptoms: Vec<String>,
    pub detected_severity_words: Vec<String>,
    pub emergency_flag: bool,
    pub duration: String,
    pub score: u32,
    pub risk_tier: RiskTier,
    pub explanation: Explanation,
}

/// Evaluates free text against one ruleset.
#[derive(Debug, Clone)]
pub struct Scorer {
    ruleset: Arc<Ruleset>,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(Ruleset::current())
    }
}

impl Scorer {
    pub fn new(ruleset: Arc<Ruleset>) -> Self {
        Self { ruleset }
    }

    pub fn ruleset(&self) -> &Arc<Ruleset> {
        &self.ruleset
    }

    /// Score `text` and classify it into a [`RiskTier`].
    ///
    /// Never fails: empty or meaningless text yields score 0, tier LOW and empty detection
    /// sets. Rejecting empty submissions is the caller's job.
    pub fn evaluate(&self, text: &str, location: Option<&str>) -> ScoreResult {
        let normalised = text.to_lowercase();
        let ruleset = &self.ruleset;

        let mut detected_symptoms = Vec::new();
        let mut symptom_points: u32 = 0;
        for entry in &ruleset.symptoms {
            if normalised.contains(entry.phrase.as_str()) {
                detected_symptoms.push(entry.phrase.clone());
                symptom_points = symptom_points.saturating_add(entry.weight);
            }
        }

        let mut detected_severity_words = Vec::new();
        let mut severity_points: u32 = 0;
        for entry in &ruleset.severity_modifiers {
            if normalised.contains(entry.phrase.as_str()) {
                detected_severity_words.push(entry.phrase.clone());
                severity_points = severity_points.saturating_add(entry.weight);
            }
        }

        // Each matched emergency phrase adds the bonus again.
        let emergency_phrases: Vec<String> = ruleset
            .emergency_phrases
            .iter()
            .filter(|phrase| normalised.contains(phrase.as_str()))
            .cloned()
            .collect();
        let emergency_flag = !emergency_phrases.is_empty();
        let emergency_points = ruleset
            .emergency_bonus
            .saturating_mul(u32::try_from(emergency_phrases.len()).unwrap_or(u32::MAX));

        let duration = extract_duration(&normalised);
        let score = symptom_points
            .saturating_add(severity_points)
            .saturating_add(emergency_points);
        let risk_tier = classify(score, emergency_flag, ruleset.thresholds);

        let severity = if detected_severity_words.is_empty() {
            SeverityLabel::Normal
        } else {
            SeverityLabel::High
        };

        let mut reasoning = format!(
            "{SCORING_REASONING} Total score {score} (symptoms {symptom_points}, severity \
             {severity_points}, emergency {emergency_points}) against MODERATE >= {}, \
             HIGH >= {} using ruleset {}.",
            ruleset.thresholds.moderate, ruleset.thresholds.high, ruleset.version
        );
        if emergency_flag {
            reasoning.push_str(" Emergency phrase detected; tier set to HIGH.");
        }

        let explanation = Explanation {
            ruleset_version: ruleset.version.clone(),
            detected_symptoms: detected_symptoms.clone(),
            detected_severity_words: detected_severity_words.clone(),
            emergency_phrases,
            severity,
            duration: duration.clone(),
            location: Location::resolve(location),
            symptom_points,
            severity_points,
            emergency_points,
            reasoning,
        };

        ScoreResult {
            detected_symptoms,
            detected_severity_words,
            emergency_flag,
            duration,
            score,
            risk_tier,
            explanation,
        }
    }
}

/// Tier classification: an emergency always wins, then the HIGH and MODERATE thresholds.
pub fn classify(score: u32, emergency_flag: bool, thresholds: Thresholds) -> RiskTier {
    if emergency_flag || score >= thresholds.high {
        RiskTier::High
    } else if score >= thresholds.moderate {
        RiskTier::Moderate
    } else {
        RiskTier::Low
    }
}

/// First `<digits><optional whitespace><unit>` match, or `"not specified"`.
pub fn extract_duration(text: &str) -> String {
    DURATION_RE
        .find(text)
        .map(|m| m.as_str().to_owned())
        .unwrap_or_else(|| DURATION_NOT_SPECIFIED.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LexiconEntry;

    fn v3() -> Scorer {
        Scorer::new(Ruleset::builtin("v3").unwrap())
    }

    #[test]
    fn empty_text_is_low_with_no_detections() {
        let result = v3().evaluate("", None);
        assert_eq!(result.risk_tier, RiskTier::Low);
        assert_eq!(result.score, 0);
        assert!(result.detected_symptoms.is_empty());
        assert!(result.detected_severity_words.is_empty());
        assert!(!result.emergency_flag);
        assert_eq!(result.duration, "not specified");
        assert_eq!(result.explanation.severity, SeverityLabel::Normal);
    }

    #[test]
    fn garbage_text_is_low() {
        let result = v3().evaluate("!!! ??? 12345 \u{1F600}", Some("Rampur"));
        assert_eq!(result.risk_tier, RiskTier::Low);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn every_symptom_phrase_is_detected_in_any_case() {
        let scorer = v3();
        for entry in scorer.ruleset().symptoms() {
            let text = format!("patient reports {} today", entry.phrase.to_uppercase());
            let result = scorer.evaluate(&text, None);
            assert!(
                result.detected_symptoms.contains(&entry.phrase),
                "{} should be detected",
                entry.phrase
            );
            assert!(result.score >= entry.weight);
        }
    }

    #[test]
    fn score_nine_is_low() {
        let result = v3().evaluate("Seizure last night", None);
        assert_eq!(result.detected_symptoms, vec!["seizure"]);
        assert_eq!(result.score, 9);
        assert_eq!(result.risk_tier, RiskTier::Low);
    }

    #[test]
    fn score_ten_is_moderate() {
        let result = v3().evaluate("possible stroke", None);
        assert_eq!(result.score, 10);
        assert_eq!(result.risk_tier, RiskTier::Moderate);
    }

    #[test]
    fn score_nineteen_is_moderate() {
        let result = v3().evaluate("stroke, then a seizure", None);
        assert_eq!(result.score, 19);
        assert_eq!(result.risk_tier, RiskTier::Moderate);
    }

    #[test]
    fn score_twenty_is_high() {
        let result = v3().evaluate("stroke and unconscious", None);
        assert_eq!(result.score, 20);
        assert_eq!(result.risk_tier, RiskTier::High);
        assert!(!result.emergency_flag);
    }

    #[test]
    fn emergency_phrase_forces_high_below_thresholds() {
        let result = v3().evaluate("patient cannot breathe", None);
        assert!(result.emergency_flag);
        assert_eq!(result.score, 15);
        assert_eq!(result.risk_tier, RiskTier::High);
        assert_eq!(result.explanation.emergency_phrases, vec!["cannot breathe"]);
        assert!(result.explanation.reasoning.contains("Emergency phrase detected"));
    }

    #[test]
    fn emergency_flag_alone_is_high_even_with_score_under_ten() {
        let ruleset = Ruleset {
            version: "test".into(),
            provenance: String::new(),
            symptoms: vec![LexiconEntry {
                phrase: "cough".into(),
                weight: 2,
            }],
            severity_modifiers: Vec::new(),
            emergency_phrases: vec!["cannot breathe".into()],
            emergency_bonus: 0,
            thresholds: Thresholds {
                moderate: 10,
                high: 20,
            },
        };
        let result = Scorer::new(Arc::new(ruleset)).evaluate("cough, cannot breathe", None);
        assert_eq!(result.score, 2);
        assert!(result.emergency_flag);
        assert_eq!(result.risk_tier, RiskTier::High);
    }

    #[test]
    fn each_emergency_phrase_adds_the_bonus() {
        let result = v3().evaluate("fainted and now unresponsive", None);
        assert_eq!(result.explanation.emergency_points, 30);
        assert_eq!(result.score, 30);
    }

    #[test]
    fn overlapping_phrases_are_double_counted() {
        let result = v3().evaluate("High Fever since morning", None);
        assert_eq!(result.detected_symptoms, vec!["high fever", "fever"]);
        assert_eq!(result.score, 8);

        let result = v3().evaluate("blood vomiting", None);
        assert_eq!(result.detected_symptoms, vec!["blood vomiting", "vomiting"]);
        assert_eq!(result.score, 13);
    }

    #[test]
    fn negation_is_not_understood() {
        let result = v3().evaluate("no fever", None);
        assert_eq!(result.detected_symptoms, vec!["fever"]);
    }

    #[test]
    fn severity_words_add_weight_and_mark_severity_high() {
        let result = v3().evaluate("persistent cough", None);
        assert_eq!(result.detected_symptoms, vec!["persistent cough", "cough"]);
        assert_eq!(result.detected_severity_words, vec!["persistent"]);
        assert_eq!(result.score, 5 + 2 + 2);
        assert_eq!(result.explanation.severity, SeverityLabel::High);
        assert_eq!(result.explanation.severity_points, 2);
    }

    #[test]
    fn duration_is_extracted_from_the_first_match() {
        assert_eq!(v3().evaluate("fever for 3 days", None).duration, "3 days");
        assert_eq!(
            v3().evaluate("pain since 2 months", None).duration,
            "2 months"
        );
        assert_eq!(
            v3().evaluate("vomiting for 12hours, 1 week ago", None).duration,
            "12hours"
        );
        assert_eq!(
            v3().evaluate("1 Week of cough", None).duration,
            "1 week"
        );
        assert_eq!(
            v3().evaluate("fever for a few days", None).duration,
            "not specified"
        );
    }

    #[test]
    fn location_defaults_to_unknown_in_explanation() {
        assert_eq!(v3().evaluate("cold", None).explanation.location.as_str(), "Unknown");
        assert_eq!(
            v3().evaluate("cold", Some("Rampur")).explanation.location.as_str(),
            "Rampur"
        );
    }

    #[test]
    fn evaluation_is_deterministic() {
        let scorer = v3();
        let text = "Severe headache and high fever for 4 days, worsening";
        assert_eq!(scorer.evaluate(text, Some("Rampur")), scorer.evaluate(text, Some("Rampur")));
    }

    #[test]
    fn older_rulesets_use_their_own_thresholds() {
        let v1 = Scorer::new(Ruleset::builtin("v1").unwrap());
        let result = v1.evaluate("chest pain and cough", None);
        assert_eq!(result.score, 8);
        assert_eq!(result.risk_tier, RiskTier::High);
        assert_eq!(result.explanation.ruleset_version, "v1");

        let v2 = Scorer::new(Ruleset::builtin("v2").unwrap());
        let result = v2.evaluate("severe headache", None);
        assert_eq!(result.score, 5 + 2);
        assert_eq!(result.risk_tier, RiskTier::Moderate);
    }

    #[test]
    fn classify_boundaries() {
        let t = Thresholds {
            moderate: 10,
            high: 20,
        };
        assert_eq!(classify(9, false, t), RiskTier::Low);
        assert_eq!(classify(10, false, t), RiskTier::Moderate);
        assert_eq!(classify(19, false, t), RiskTier::Moderate);
        assert_eq!(classify(20, false, t), RiskTier::High);
        assert_eq!(classify(0, true, t), RiskTier::High);
    }
}
