//! # Evaluation Report Module
//!
//! The serializable result of evaluating one job, wrapped in the response
//! envelope handed back to callers:
//!
//! ```json
//! {
//!   "success": true,
//!   "message": "Evaluation complete.",
//!   "data": {
//!     "job_id": "...",
//!     "score": 0.75,
//!     "tests": [
//!       { "test_id": "t1", "status": "OK", "outcome": "passed", "score": 0.75, ... }
//!     ],
//!     "feedback": [ { "test": "t1", "message": "Passed with score 0.75" } ],
//!     "created_at": "2025-01-01T00:00:00+00:00",
//!     "updated_at": "2025-01-01T00:00:00+00:00"
//!   }
//! }
//! ```

use serde::Serialize;

use crate::traits::feedback::FeedbackEntry;
use crate::types::{TestResult, TestStatus};

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub job_id: String,
    /// Final score in `[0, 1]`.
    pub score: f64,
    /// One verdict per declared test.
    pub tests: Vec<TestResult>,
    pub feedback: Vec<FeedbackEntry>,
    /// RFC 3339.
    pub created_at: String,
    /// RFC 3339.
    pub updated_at: String,
}

impl EvaluationReport {
    pub fn passed(&self) -> usize {
        self.tests.iter().filter(|t| t.status == TestStatus::Ok).count()
    }
}

#[derive(Debug, Serialize)]
pub struct EvaluationReportResponse {
    success: bool,
    message: String,
    data: EvaluationReport,
}

impl EvaluationReportResponse {
    pub fn data(&self) -> &EvaluationReport {
        &self.data
    }

    pub fn into_data(self) -> EvaluationReport {
        self.data
    }
}

impl From<EvaluationReport> for EvaluationReportResponse {
    fn from(report: EvaluationReport) -> Self {
        EvaluationReportResponse {
            success: true,
            message: "Evaluation complete.".to_string(),
            data: report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestOutcome;
    use serde_json::Value;

    #[test]
    fn test_response_serialization() {
        let report = EvaluationReport {
            job_id: "job-1".to_string(),
            score: 0.5,
            tests: vec![TestResult {
                test_id: "t1".to_string(),
                status: TestStatus::Ok,
                outcome: TestOutcome::Passed,
                score: 0.5,
                limits: None,
                exitcode: Some(0),
            }],
            feedback: vec![FeedbackEntry {
                test: "t1".to_string(),
                message: "Passed with score 0.50".to_string(),
            }],
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
            updated_at: "2025-01-01T00:00:00+00:00".to_string(),
        };
        assert_eq!(report.passed(), 1);

        let response: EvaluationReportResponse = report.into();
        let value: Value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Evaluation complete.");
        assert_eq!(value["data"]["job_id"], "job-1");
        assert_eq!(value["data"]["score"], 0.5);
        assert_eq!(value["data"]["tests"][0]["status"], "OK");
        assert_eq!(value["data"]["tests"][0]["outcome"], "passed");
        assert_eq!(value["data"]["tests"][0]["exitcode"], 0);
        assert!(value["data"]["tests"][0].get("limits").is_none());
        assert_eq!(value["data"]["feedback"][0]["test"], "t1");
    }
}
