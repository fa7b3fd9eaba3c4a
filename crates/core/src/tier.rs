use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Discrete triage tier, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Moderate, RiskTier::High];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Moderate => "MODERATE",
            RiskTier::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = crate::TriageError;

    /// Accepts `LOW`, `moderate`, `High Risk` and similar spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let label = upper.strip_suffix(" RISK").unwrap_or(&upper).trim();
        match label {
            "LOW" => Ok(RiskTier::Low),
            "MODERATE" => Ok(RiskTier::Moderate),
            "HIGH" => Ok(RiskTier::High),
            _ => Err(crate::TriageError::InvalidInput(format!(
                "unknown risk tier '{}' (expected LOW, MODERATE or HIGH)",
                s.trim()
            ))),
        }
    }
}
