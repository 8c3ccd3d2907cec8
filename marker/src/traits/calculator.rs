//! Score calculator trait.

use std::collections::BTreeMap;

use crate::error::MarkerError;

/// Reduces per-test scores, each in `[0, 1]`, to one final score in `[0, 1]`.
pub trait ScoreCalculator: Send + Sync {
    /// Checks the configuration against the declared tests before any
    /// submission is scored.
    fn validate(&self, test_names: &[String]) -> Result<(), MarkerError>;

    fn compute(&self, scores: &BTreeMap<String, f64>) -> Result<f64, MarkerError>;

    /// The configuration as stored with the exercise.
    fn to_config(&self) -> serde_json::Value;
}
