//! # Scoring Module
//!
//! Picks the calculator an exercise is scored with:
//!
//! ```json
//! { "calculator": "tree", "config": { "type": "value", "value": 1.0 } }
//! { "calculator": "weighted", "config": { "test_weights": { "t1": 1 } } }
//! ```

pub mod tree;
pub mod weighted;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MarkerError;
use crate::traits::calculator::ScoreCalculator;
use tree::TreeCalculator;
use weighted::WeightedCalculator;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoreConfig {
    pub calculator: String,
    #[serde(default)]
    pub config: Value,
}

impl ScoreConfig {
    pub fn from_json(raw: &str) -> Result<Self, MarkerError> {
        serde_json::from_str(raw).map_err(|e| MarkerError::InvalidScoreConfig(e.to_string()))
    }

    /// Builds the calculator, restricted to the given tests when any are given.
    pub fn build(&self, test_names: &[String]) -> Result<Box<dyn ScoreCalculator>, MarkerError> {
        let calculator: Box<dyn ScoreCalculator> = match self.calculator.as_str() {
            "tree" => Box::new(
                TreeCalculator::from_config(&self.config)?.with_known_tests(test_names.to_vec()),
            ),
            "weighted" => {
                let config = if self.config.is_null() {
                    Value::Object(Default::default())
                } else {
                    self.config.clone()
                };
                Box::new(WeightedCalculator::from_config(&config)?)
            }
            other => {
                return Err(MarkerError::InvalidScoreConfig(format!(
                    "unknown calculator '{other}'"
                )));
            }
        };
        if !test_names.is_empty() {
            calculator.validate(test_names)?;
        }
        Ok(calculator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_build_tree() {
        let config: ScoreConfig = serde_json::from_value(json!({
            "calculator": "tree",
            "config": {"type": "test-result", "test": "t1"}
        }))
        .unwrap();
        let calc = config.build(&["t1".to_string()]).unwrap();
        let scores = BTreeMap::from([("t1".to_string(), 0.4)]);
        assert_eq!(calc.compute(&scores).unwrap(), 0.4);
        assert_eq!(calc.to_config(), config.config);
    }

    #[test]
    fn test_build_weighted_without_config() {
        let config = ScoreConfig::from_json(r#"{"calculator": "weighted"}"#).unwrap();
        let calc = config.build(&[]).unwrap();
        let scores = BTreeMap::from([("a".to_string(), 1.0), ("b".to_string(), 0.0)]);
        assert_eq!(calc.compute(&scores).unwrap(), 0.5);
    }

    #[test]
    fn test_build_rejects_bad_configs() {
        let unknown = ScoreConfig::from_json(r#"{"calculator": "median"}"#).unwrap();
        assert!(matches!(unknown.build(&[]), Err(MarkerError::InvalidScoreConfig(_))));

        let stray = ScoreConfig::from_json(
            r#"{"calculator": "tree", "config": {"type": "test-result", "test": "t7"}}"#,
        )
        .unwrap();
        assert!(matches!(
            stray.build(&["t1".to_string()]),
            Err(MarkerError::UnknownTestName(_))
        ));
        assert!(ScoreConfig::from_json("[]").is_err());
    }
}
