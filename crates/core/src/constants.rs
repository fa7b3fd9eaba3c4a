//! Constants used throughout the triage core crate.

/// Filename of the append-only case journal inside the data directory.
pub const CASE_JOURNAL_FILENAME: &str = "cases.jsonl";

/// Ruleset used when no version is configured.
pub const DEFAULT_RULESET_VERSION: &str = "v3";

/// Duration value recorded when the text contains no numeric duration phrase.
pub const DURATION_NOT_SPECIFIED: &str = "not specified";

/// Opening sentence of every explanation's reasoning string.
pub const SCORING_REASONING: &str = "Risk calculated using keyword-based weighted scoring.";

/// Duration pattern. Longer unit spellings come first so that `3 days` is matched whole
/// rather than stopping at `3 day`.
pub const DURATION_PATTERN: &str = r"\d+\s*(?:days|day|weeks|week|months|month|hours|hour)";
