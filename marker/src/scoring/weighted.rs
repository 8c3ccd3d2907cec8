//! Weighted average of test scores.
//!
//! ```json
//! { "test_weights": { "A": 200, "B": 800 } }
//! ```
//!
//! Without weights every scored test counts equally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MarkerError;
use crate::traits::calculator::ScoreCalculator;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct WeightedCalculator {
    #[serde(default)]
    test_weights: BTreeMap<String, f64>,
}

impl WeightedCalculator {
    /// Equal weights.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Value) -> Result<Self, MarkerError> {
        let calculator: WeightedCalculator = serde_json::from_value(config.clone())
            .map_err(|e| MarkerError::InvalidScoreConfig(e.to_string()))?;
        calculator.check_weights()?;
        Ok(calculator)
    }

    pub fn with_weight(mut self, test: impl Into<String>, weight: f64) -> Self {
        self.test_weights.insert(test.into(), weight);
        self
    }

    fn check_weights(&self) -> Result<(), MarkerError> {
        match self
            .test_weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            Some((test, weight)) => Err(MarkerError::InvalidScoreConfig(format!(
                "weight of test '{test}' must be a non-negative number, got {weight}"
            ))),
            None => Ok(()),
        }
    }
}

impl ScoreCalculator for WeightedCalculator {
    fn validate(&self, test_names: &[String]) -> Result<(), MarkerError> {
        self.check_weights()?;
        match self
            .test_weights
            .keys()
            .find(|t| !test_names.contains(t))
        {
            Some(unknown) => Err(MarkerError::UnknownTestName(unknown.clone())),
            None => Ok(()),
        }
    }

    fn compute(&self, scores: &BTreeMap<String, f64>) -> Result<f64, MarkerError> {
        let (weighted, total) = if self.test_weights.is_empty() {
            (scores.values().sum::<f64>(), scores.len() as f64)
        } else {
            self.test_weights
                .iter()
                .fold((0.0, 0.0), |(sum, total), (test, weight)| {
                    let score = scores.get(test).copied().unwrap_or(0.0);
                    (sum + score * weight, total + weight)
                })
        };

        if total == 0.0 {
            Ok(0.0)
        } else {
            Ok(weighted / total)
        }
    }

    fn to_config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
