//! # Feedback Trait
//!
//! A [`Feedback`] strategy writes one or more [`FeedbackEntry`]s from the
//! verdicts of a graded submission.

use crate::error::MarkerError;
use crate::types::TestResult;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackEntry {
    pub test: String,
    pub message: String,
}

pub trait Feedback {
    fn assemble_feedback(&self, results: &[TestResult]) -> Result<Vec<FeedbackEntry>, MarkerError>;
}
