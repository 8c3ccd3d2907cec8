//! Results Report Parser
//!
//! Parses the report the worker returns for a job:
//!
//! ```json
//! {
//!   "job_id": "...",
//!   "error_message": null,
//!   "results": [
//!     { "task_id": "t1.run", "status": "OK",
//!       "sandbox_results": { "exitcode": 0, "time": 0.1, "wall_time": 0.2,
//!                            "memory": 2048, "status": "OK" } },
//!     { "task_id": "t1.judge", "status": "OK", "output": "0.75" }
//!   ]
//! }
//! ```

use std::collections::HashSet;

use serde_json::Value;

use crate::error::MarkerError;
use crate::traits::report_parser::ReportParser;
use crate::types::ResultsReport;

pub struct ResultsParser {
    expected_job_id: String,
}

impl ResultsParser {
    pub fn new(expected_job_id: impl Into<String>) -> Self {
        ResultsParser {
            expected_job_id: expected_job_id.into(),
        }
    }

    pub fn parse_str(&self, raw: &str) -> Result<ResultsReport, MarkerError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| MarkerError::InvalidReport(format!("malformed JSON: {e}")))?;
        self.parse(&value)
    }
}

impl ReportParser<ResultsReport> for ResultsParser {
    fn parse(&self, raw: &Value) -> Result<ResultsReport, MarkerError> {
        if !raw.is_object() {
            return Err(MarkerError::InvalidReport(
                "report must be a JSON object".to_string(),
            ));
        }
        let report: ResultsReport = serde_json::from_value(raw.clone())
            .map_err(|e| MarkerError::InvalidReport(e.to_string()))?;

        if report.job_id != self.expected_job_id {
            return Err(MarkerError::JobIdMismatch {
                expected: self.expected_job_id.clone(),
                actual: report.job_id,
            });
        }
        if let Some(message) = report.error_message.as_deref().filter(|m| !m.is_empty()) {
            return Err(MarkerError::JobFailed(message.to_string()));
        }

        let mut seen = HashSet::new();
        for result in &report.results {
            if !seen.insert(result.task_id.as_str()) {
                return Err(MarkerError::InvalidReport(format!(
                    "task '{}' is reported more than once",
                    result.task_id
                )));
            }
        }

        tracing::debug!(
            job_id = %report.job_id,
            results = report.results.len(),
            "parsed results report"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskStatus;
    use serde_json::json;

    #[test]
    fn test_parse_valid_report() {
        let raw = json!({
            "job_id": "job-1",
            "results": [
                {"task_id": "t1.run", "status": "OK",
                 "sandbox_results": {"exitcode": 0, "time": 0.1, "wall_time": 0.2,
                                     "memory": 2048, "status": "OK"}},
                {"task_id": "t1.judge", "status": "FAILED", "output": "0"}
            ]
        });
        let report = ResultsParser::new("job-1").parse(&raw).unwrap();
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.result("t1.judge").unwrap().status, TaskStatus::Failed);
        assert_eq!(report.result("t1.run").unwrap().stats.as_ref().unwrap().memory, 2048);
    }

    #[test]
    fn test_job_id_mismatch() {
        let raw = json!({"job_id": "other", "results": []});
        let err = ResultsParser::new("job-1").parse(&raw).unwrap_err();
        assert!(matches!(
            err,
            MarkerError::JobIdMismatch { ref expected, ref actual } if expected == "job-1" && actual == "other"
        ));
    }

    #[test]
    fn test_worker_error_message() {
        let raw = json!({"job_id": "job-1", "error_message": "cannot fetch 1.in", "results": []});
        assert!(matches!(
            ResultsParser::new("job-1").parse(&raw),
            Err(MarkerError::JobFailed(ref m)) if m == "cannot fetch 1.in"
        ));

        let raw = json!({"job_id": "job-1", "error_message": "", "results": []});
        assert!(ResultsParser::new("job-1").parse(&raw).is_ok());
    }

    #[test]
    fn test_incomplete_statistics_are_invalid() {
        let raw = json!({
            "job_id": "job-1",
            "results": [
                {"task_id": "t1.run", "status": "OK",
                 "sandbox_results": {"exitcode": 0, "time": 0.1}}
            ]
        });
        assert!(matches!(
            ResultsParser::new("job-1").parse(&raw),
            Err(MarkerError::InvalidReport(_))
        ));
    }

    #[test]
    fn test_unknown_status_and_duplicates() {
        let raw = json!({"job_id": "job-1", "results": [{"task_id": "a", "status": "MAYBE"}]});
        assert!(ResultsParser::new("job-1").parse(&raw).is_err());

        let raw = json!({"job_id": "job-1", "results": [
            {"task_id": "a", "status": "OK"}, {"task_id": "a", "status": "OK"}
        ]});
        assert!(matches!(
            ResultsParser::new("job-1").parse(&raw),
            Err(MarkerError::InvalidReport(_))
        ));
    }

    #[test]
    fn test_malformed_text() {
        assert!(matches!(
            ResultsParser::new("job-1").parse_str("{not json"),
            Err(MarkerError::InvalidReport(_))
        ));
    }
}
