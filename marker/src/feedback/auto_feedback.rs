//! # AutoFeedback Strategy
//!
//! Template feedback, one entry per test, derived from the test's outcome:
//!
//! - skipped tests say so;
//! - failed executions report the exit code;
//! - exceeded limits say which limit and by how much;
//! - rejected output and passing scores are stated as such.

use crate::error::MarkerError;
use crate::traits::feedback::{Feedback, FeedbackEntry};
use crate::types::{TestOutcome, TestResult};

#[derive(Debug)]
pub struct AutoFeedback;

fn limits_message(result: &TestResult) -> String {
    let Some(verdict) = result.limits else {
        return "Resource limits exceeded".to_string();
    };
    let mut exceeded = Vec::new();
    if !verdict.time_ok {
        exceeded.push(format!(
            "time limit ({:.0}% used)",
            verdict.used_time_ratio * 100.0
        ));
    }
    if !verdict.memory_ok {
        exceeded.push(format!(
            "memory limit ({:.0}% used)",
            verdict.used_memory_ratio * 100.0
        ));
    }
    format!("Exceeded {}", exceeded.join(" and "))
}

impl Feedback for AutoFeedback {
    fn assemble_feedback(&self, results: &[TestResult]) -> Result<Vec<FeedbackEntry>, MarkerError> {
        let entries = results
            .iter()
            .map(|result| {
                let message = match result.outcome {
                    TestOutcome::ExecutionSkipped => "Not run".to_string(),
                    TestOutcome::ExecutionFailed => match result.exitcode {
                        Some(code) => format!("Execution failed with exit code {code}"),
                        None => "Execution failed".to_string(),
                    },
                    TestOutcome::EvaluationSkipped => "Output was not evaluated".to_string(),
                    TestOutcome::LimitsExceeded => limits_message(result),
                    TestOutcome::WrongAnswer => "Wrong answer".to_string(),
                    TestOutcome::Passed => {
                        format!("Passed with score {:.2}", result.score)
                    }
                };
                FeedbackEntry {
                    test: result.test_id.clone(),
                    message,
                }
            })
            .collect();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestStatus;
    use util::limits::LimitsVerdict;

    fn make_result(test: &str, status: TestStatus, outcome: TestOutcome, score: f64) -> TestResult {
        TestResult {
            test_id: test.to_string(),
            status,
            outcome,
            score,
            limits: None,
            exitcode: None,
        }
    }

    fn messages(results: &[TestResult]) -> Vec<String> {
        AutoFeedback
            .assemble_feedback(results)
            .unwrap()
            .into_iter()
            .map(|f| f.message)
            .collect()
    }

    #[test]
    fn test_one_entry_per_test() {
        let results = vec![
            make_result("t1", TestStatus::Ok, TestOutcome::Passed, 0.75),
            make_result("t2", TestStatus::Skipped, TestOutcome::ExecutionSkipped, 0.0),
            make_result("t3", TestStatus::Failed, TestOutcome::WrongAnswer, 0.0),
        ];
        let feedback = AutoFeedback.assemble_feedback(&results).unwrap();
        assert_eq!(
            feedback,
            vec![
                FeedbackEntry { test: "t1".to_string(), message: "Passed with score 0.75".to_string() },
                FeedbackEntry { test: "t2".to_string(), message: "Not run".to_string() },
                FeedbackEntry { test: "t3".to_string(), message: "Wrong answer".to_string() },
            ]
        );
    }

    #[test]
    fn test_execution_failure_reports_exit_code() {
        let mut result = make_result("t1", TestStatus::Failed, TestOutcome::ExecutionFailed, 0.0);
        result.exitcode = Some(139);
        assert_eq!(messages(&[result]), vec!["Execution failed with exit code 139"]);
    }

    #[test]
    fn test_limits_message() {
        let mut result = make_result("t1", TestStatus::Failed, TestOutcome::LimitsExceeded, 0.0);
        result.limits = Some(LimitsVerdict {
            time_ok: false,
            memory_ok: false,
            meets_all: false,
            used_memory_ratio: 1.5,
            used_time_ratio: 2.0,
        });
        assert_eq!(
            messages(&[result]),
            vec!["Exceeded time limit (200% used) and memory limit (150% used)"]
        );
    }

    #[test]
    fn test_empty_results() {
        assert!(messages(&[]).is_empty());
    }
}
