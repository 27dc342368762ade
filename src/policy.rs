use serde::Deserialize;

use crate::scoring::ScoreResult;

/// Score thresholds above which a message is deleted.
///
/// The scales are intentionally uneven: the scoring API reports `average` on
/// a wider scale than `toxicity`/`obscene`. The literal values mirror the
/// service's documented operating point, so they are kept as-is rather than
/// normalized to a common range.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Thresholds {
    #[serde(default = "default_average")]
    pub average: f64,
    #[serde(default = "default_toxicity")]
    pub toxicity: f64,
    #[serde(default = "default_obscene")]
    pub obscene: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            average: default_average(),
            toxicity: default_toxicity(),
            obscene: default_obscene(),
        }
    }
}

fn default_average() -> f64 {
    20.0
}

fn default_toxicity() -> f64 {
    50.0
}

fn default_obscene() -> f64 {
    50.0
}

/// What to do with a scored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Delete,
}

/// Map a score to a decision. Delete only when a score strictly exceeds its
/// threshold; a score exactly at the threshold is allowed.
pub fn evaluate(result: &ScoreResult, thresholds: &Thresholds) -> Decision {
    if result.average > thresholds.average
        || result.toxicity > thresholds.toxicity
        || result.obscene > thresholds.obscene
    {
        Decision::Delete
    } else {
        Decision::Allow
    }
}
