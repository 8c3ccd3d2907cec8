//! # Marker Library
//!
//! Turns the worker's results report for a compiled job into a score.
//!
//! ## Key Concepts
//! - **EvaluationJob**: evaluates one job's results report.
//! - **Aggregation**: folds task results into one verdict per test, with
//!   resource limits taking precedence over judge output.
//! - **Calculators**: reduce per-test scores to a final score, either with a
//!   score expression tree or a weighted average.
//! - **Feedback**: per-test messages for the submitter.

pub mod aggregate;
pub mod error;
pub mod feedback;
pub mod parsers;
pub mod report;
pub mod scoring;
pub mod traits;
pub mod types;

use std::collections::BTreeMap;

use chrono::Utc;
use pipeline::CompiledJob;
use serde_json::Value;

use crate::error::MarkerError;
use crate::feedback::auto_feedback::AutoFeedback;
use crate::parsers::results_parser::ResultsParser;
use crate::report::{EvaluationReport, EvaluationReportResponse};
use crate::scoring::weighted::WeightedCalculator;
use crate::traits::calculator::ScoreCalculator;
use crate::traits::feedback::Feedback;
use crate::traits::report_parser::ReportParser;

/// Evaluation of one compiled job against the report its worker returned.
///
/// Scores with equal test weights and [`AutoFeedback`] unless told otherwise.
pub struct EvaluationJob<'a> {
    job: &'a CompiledJob,
    report: Value,
    calculator: Box<dyn ScoreCalculator + 'a>,
    feedback: Box<dyn Feedback + Send + Sync + 'a>,
}

impl<'a> EvaluationJob<'a> {
    /// # Arguments
    /// * `job` - The job the worker ran.
    /// * `report` - The worker's raw results report.
    pub fn new(job: &'a CompiledJob, report: Value) -> Self {
        Self {
            job,
            report,
            calculator: Box::new(WeightedCalculator::new()),
            feedback: Box::new(AutoFeedback),
        }
    }

    pub fn with_calculator<C: ScoreCalculator + 'a>(mut self, calculator: C) -> Self {
        self.calculator = Box::new(calculator);
        self
    }

    /// Same as [`Self::with_calculator`] for an already boxed calculator,
    /// e.g. one built from a [`scoring::ScoreConfig`].
    pub fn with_boxed_calculator(mut self, calculator: Box<dyn ScoreCalculator + 'a>) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_feedback<F: Feedback + Send + Sync + 'a>(mut self, feedback: F) -> Self {
        self.feedback = Box::new(feedback);
        self
    }

    /// Runs the evaluation.
    ///
    /// # Steps
    /// 1. Parses the report, checking the job id and worker errors.
    /// 2. Aggregates one verdict per test.
    /// 3. Computes the final score, clamped into `[0, 1]`.
    /// 4. Assembles feedback.
    ///
    /// Failed or skipped tests are regular verdicts scoring 0; an `Err` means
    /// the report or the score configuration is unusable.
    pub fn evaluate(self) -> Result<EvaluationReportResponse, MarkerError> {
        let parsed = ResultsParser::new(self.job.job_id.clone()).parse(&self.report)?;
        let tests = aggregate::aggregate(self.job, &parsed)?;

        self.calculator.validate(&self.job.tests)?;
        let scores: BTreeMap<String, f64> = tests
            .iter()
            .map(|t| (t.test_id.clone(), t.score))
            .collect();
        let score = self.calculator.compute(&scores)?.clamp(0.0, 1.0);

        let feedback = self.feedback.assemble_feedback(&tests)?;

        let now = Utc::now().to_rfc3339();
        let report = EvaluationReport {
            job_id: parsed.job_id,
            score,
            tests,
            feedback,
            created_at: now.clone(),
            updated_at: now,
        };
        tracing::info!(
            job_id = %report.job_id,
            score = report.score,
            passed = report.passed(),
            total = report.tests.len(),
            "evaluation complete"
        );
        Ok(report.into())
    }
}
