//! # Score Tree
//!
//! A small expression tree evaluated bottom-up over a `test -> score` map.
//!
//! ## Serialized form
//!
//! ```json
//! { "type": "clamp", "children": [
//!     { "type": "sub", "children": [
//!         { "type": "value", "value": 1.0 },
//!         { "type": "test-result", "test": "t1" }
//!     ] }
//! ] }
//! ```
//!
//! | tag           | children | result                          |
//! |---------------|----------|---------------------------------|
//! | `value`       | 0        | the literal `value`             |
//! | `test-result` | 0        | score of `test` (0 if unscored) |
//! | `neg`         | 1        | `-a`                            |
//! | `clamp`       | 1        | `a` clamped into `[0, 1]`       |
//! | `sub`         | 2        | `a - b`                         |
//! | `div`         | 2        | `a / b`, or 0 when `b` is 0     |
//! | `sum` `avg` `min` `max` `mul` | 1 or more | fold over children |
//!
//! Arity is checked when the tree is built from its serialized form, so a
//! built [`ScoreNode`] always evaluates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MarkerError;
use crate::traits::calculator::ScoreCalculator;

/// Serialized node, as stored with the exercise.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RawNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unary {
    Neg,
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binary {
    Sub,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variadic {
    Sum,
    Avg,
    Min,
    Max,
    Mul,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreNode {
    Value(f64),
    TestResult(String),
    Unary(Unary, Box<ScoreNode>),
    Binary(Binary, Box<ScoreNode>, Box<ScoreNode>),
    Variadic(Variadic, Vec<ScoreNode>),
}

impl Unary {
    fn tag(self) -> &'static str {
        match self {
            Unary::Neg => "neg",
            Unary::Clamp => "clamp",
        }
    }

    fn apply(self, a: f64) -> f64 {
        match self {
            Unary::Neg => -a,
            Unary::Clamp => a.clamp(0.0, 1.0),
        }
    }
}

impl Binary {
    fn tag(self) -> &'static str {
        match self {
            Binary::Sub => "sub",
            Binary::Div => "div",
        }
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Binary::Sub => a - b,
            Binary::Div if b == 0.0 => 0.0,
            Binary::Div => a / b,
        }
    }
}

impl Variadic {
    fn tag(self) -> &'static str {
        match self {
            Variadic::Sum => "sum",
            Variadic::Avg => "avg",
            Variadic::Min => "min",
            Variadic::Max => "max",
            Variadic::Mul => "mul",
        }
    }

    fn apply(self, values: &[f64]) -> f64 {
        match self {
            Variadic::Sum => values.iter().sum(),
            Variadic::Avg if values.is_empty() => 0.0,
            Variadic::Avg => values.iter().sum::<f64>() / values.len() as f64,
            Variadic::Min => values.iter().copied().reduce(f64::min).unwrap_or(0.0),
            Variadic::Max => values.iter().copied().reduce(f64::max).unwrap_or(0.0),
            Variadic::Mul => values.iter().product(),
        }
    }
}

fn expect_arity(raw: &RawNode, expected: usize) -> Result<(), MarkerError> {
    if raw.children.len() == expected {
        Ok(())
    } else {
        Err(MarkerError::Arity {
            node: raw.node_type.clone(),
            expected,
            actual: raw.children.len(),
        })
    }
}

impl ScoreNode {
    /// Builds a node from its serialized form, checking tags and arity.
    pub fn from_raw(raw: &RawNode) -> Result<ScoreNode, MarkerError> {
        let unary = |op: Unary| -> Result<ScoreNode, MarkerError> {
            expect_arity(raw, 1)?;
            Ok(ScoreNode::Unary(op, Box::new(ScoreNode::from_raw(&raw.children[0])?)))
        };
        let binary = |op: Binary| -> Result<ScoreNode, MarkerError> {
            expect_arity(raw, 2)?;
            Ok(ScoreNode::Binary(
                op,
                Box::new(ScoreNode::from_raw(&raw.children[0])?),
                Box::new(ScoreNode::from_raw(&raw.children[1])?),
            ))
        };
        let variadic = |op: Variadic| -> Result<ScoreNode, MarkerError> {
            if raw.children.is_empty() {
                return Err(MarkerError::VariadicArity(raw.node_type.clone()));
            }
            let children = raw
                .children
                .iter()
                .map(ScoreNode::from_raw)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ScoreNode::Variadic(op, children))
        };

        match raw.node_type.as_str() {
            "value" => {
                expect_arity(raw, 0)?;
                let value = raw.value.ok_or_else(|| {
                    MarkerError::InvalidScoreConfig("'value' node has no value".to_string())
                })?;
                Ok(ScoreNode::Value(value))
            }
            "test-result" => {
                expect_arity(raw, 0)?;
                let test = raw.test.clone().ok_or_else(|| {
                    MarkerError::InvalidScoreConfig("'test-result' node names no test".to_string())
                })?;
                Ok(ScoreNode::TestResult(test))
            }
            "neg" => unary(Unary::Neg),
            "clamp" => unary(Unary::Clamp),
            "sub" => binary(Binary::Sub),
            "div" => binary(Binary::Div),
            "sum" => variadic(Variadic::Sum),
            "avg" => variadic(Variadic::Avg),
            "min" => variadic(Variadic::Min),
            "max" => variadic(Variadic::Max),
            "mul" => variadic(Variadic::Mul),
            other => Err(MarkerError::UnknownNodeType(other.to_string())),
        }
    }

    pub fn to_raw(&self) -> RawNode {
        let node = |tag: &str, children: Vec<RawNode>| RawNode {
            node_type: tag.to_string(),
            value: None,
            test: None,
            children,
        };
        match self {
            ScoreNode::Value(value) => RawNode {
                value: Some(*value),
                ..node("value", vec![])
            },
            ScoreNode::TestResult(test) => RawNode {
                test: Some(test.clone()),
                ..node("test-result", vec![])
            },
            ScoreNode::Unary(op, a) => node(op.tag(), vec![a.to_raw()]),
            ScoreNode::Binary(op, a, b) => node(op.tag(), vec![a.to_raw(), b.to_raw()]),
            ScoreNode::Variadic(op, children) => {
                node(op.tag(), children.iter().map(ScoreNode::to_raw).collect())
            }
        }
    }

    /// Test names the tree reads, in tree order.
    pub fn tests(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_tests(&mut names);
        names
    }

    fn collect_tests<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            ScoreNode::Value(_) => {}
            ScoreNode::TestResult(test) => names.push(test),
            ScoreNode::Unary(_, a) => a.collect_tests(names),
            ScoreNode::Binary(_, a, b) => {
                a.collect_tests(names);
                b.collect_tests(names);
            }
            ScoreNode::Variadic(_, children) => {
                children.iter().for_each(|c| c.collect_tests(names));
            }
        }
    }

    /// Evaluates the tree. A non-empty `known_tests` restricts which tests a
    /// `test-result` leaf may name.
    pub fn evaluate(
        &self,
        scores: &BTreeMap<String, f64>,
        known_tests: &[String],
    ) -> Result<f64, MarkerError> {
        Ok(match self {
            ScoreNode::Value(value) => *value,
            ScoreNode::TestResult(test) => {
                if !known_tests.is_empty() && !known_tests.iter().any(|t| t == test) {
                    return Err(MarkerError::UnknownTestName(test.clone()));
                }
                scores.get(test).copied().unwrap_or(0.0)
            }
            ScoreNode::Unary(op, a) => op.apply(a.evaluate(scores, known_tests)?),
            ScoreNode::Binary(op, a, b) => op.apply(
                a.evaluate(scores, known_tests)?,
                b.evaluate(scores, known_tests)?,
            ),
            ScoreNode::Variadic(op, children) => {
                let values = children
                    .iter()
                    .map(|c| c.evaluate(scores, known_tests))
                    .collect::<Result<Vec<_>, _>>()?;
                op.apply(&values)
            }
        })
    }
}

/// Scores a submission with a [`ScoreNode`] tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeCalculator {
    root: ScoreNode,
    known_tests: Vec<String>,
}

impl TreeCalculator {
    pub fn new(root: ScoreNode) -> Self {
        TreeCalculator {
            root,
            known_tests: Vec::new(),
        }
    }

    pub fn from_config(config: &Value) -> Result<Self, MarkerError> {
        let raw: RawNode = serde_json::from_value(config.clone())
            .map_err(|e| MarkerError::InvalidScoreConfig(e.to_string()))?;
        Ok(TreeCalculator::new(ScoreNode::from_raw(&raw)?))
    }

    /// Restricts `test-result` leaves to the given tests.
    pub fn with_known_tests(mut self, tests: Vec<String>) -> Self {
        self.known_tests = tests;
        self
    }

    pub fn root(&self) -> &ScoreNode {
        &self.root
    }
}

impl ScoreCalculator for TreeCalculator {
    fn validate(&self, test_names: &[String]) -> Result<(), MarkerError> {
        match self.root.tests().into_iter().find(|t| !test_names.iter().any(|n| n.as_str() == *t)) {
            Some(unknown) => Err(MarkerError::UnknownTestName(unknown.to_string())),
            None => Ok(()),
        }
    }

    fn compute(&self, scores: &BTreeMap<String, f64>) -> Result<f64, MarkerError> {
        self.root.evaluate(scores, &self.known_tests)
    }

    fn to_config(&self) -> Value {
        serde_json::to_value(self.root.to_raw()).unwrap_or(Value::Null)
    }
}
