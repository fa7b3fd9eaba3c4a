//! Case distribution analytics.
//!
//! Risk buckets are keyed by the tier the scorer assigned. Doctor overrides are reported in
//! their own `override_distribution` and never move a case between risk buckets, so the
//! risk distribution always reflects the raw machine assessment.

use crate::case::Case;
use crate::tier::RiskTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Scored tier to case count. All three tiers are always present.
    pub risk_distribution: BTreeMap<RiskTier, usize>,
    pub location_distribution: BTreeMap<String, usize>,
    /// Current override tier to case count, for overridden cases only.
    pub override_distribution: BTreeMap<RiskTier, usize>,
    pub total_cases: usize,
}

/// Count each case exactly once by scored tier and by location.
pub fn summarize(cases: &[Case]) -> AnalyticsSummary {
    let mut risk_distribution: BTreeMap<RiskTier, usize> =
        RiskTier::ALL.iter().map(|&tier| (tier, 0)).collect();
    let mut location_distribution = BTreeMap::new();
    let mut override_distribution = BTreeMap::new();

    for case in cases {
        *risk_distribution.entry(case.risk_tier()).or_insert(0) += 1;
        *location_distribution
            .entry(case.location().as_str().to_owned())
            .or_insert(0) += 1;
        if let Some(tier) = case.doctor_override() {
            *override_distribution.entry(tier).or_insert(0) += 1;
        }
    }

    AnalyticsSummary {
        risk_distribution,
        location_distribution,
        override_distribution,
        total_cases: cases.len(),
    }
}
