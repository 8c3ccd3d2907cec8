//! Marker Error Types
//!
//! [`MarkerError`] covers everything that can go wrong while turning a
//! worker's results report into a score. Two kinds are kept apart:
//!
//! - **Reporting errors**: the report is malformed, belongs to another job,
//!   or lacks statistics an execution task must carry. Evaluation fails and
//!   the operator is told; no score is produced.
//! - **Authoring errors**: the score configuration is broken. These go to
//!   the exercise author.
//!
//! A test that failed, ran out of limits or was skipped is not an error; it
//! is a regular [`crate::types::TestStatus`] with score 0.

use pipeline::PipelineError;

#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    #[error("results report belongs to job '{actual}', expected '{expected}'")]
    JobIdMismatch { expected: String, actual: String },

    #[error("execution task '{0}' reported no sandbox statistics")]
    MissingStatistics(String),

    #[error("invalid results report: {0}")]
    InvalidReport(String),

    #[error("job failed on the worker: {0}")]
    JobFailed(String),

    #[error("score tree references unknown test '{0}'")]
    UnknownTestName(String),

    #[error("'{0}' node needs at least one child")]
    VariadicArity(String),

    #[error("'{node}' node needs exactly {expected} children, got {actual}")]
    Arity {
        node: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown score node type '{0}'")]
    UnknownNodeType(String),

    #[error("invalid score configuration: {0}")]
    InvalidScoreConfig(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl MarkerError {
    /// Whether the exercise author has to fix something.
    pub fn is_authoring_error(&self) -> bool {
        matches!(
            self,
            MarkerError::UnknownTestName(_)
                | MarkerError::VariadicArity(_)
                | MarkerError::Arity { .. }
                | MarkerError::UnknownNodeType(_)
                | MarkerError::InvalidScoreConfig(_)
                | MarkerError::Pipeline(_)
        )
    }

    /// Whether the worker's report could not be used.
    pub fn is_reporting_error(&self) -> bool {
        !self.is_authoring_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(MarkerError::UnknownNodeType("pow".into()).is_authoring_error());
        assert!(MarkerError::MissingStatistics("t1.run".into()).is_reporting_error());
        assert!(
            MarkerError::JobIdMismatch {
                expected: "a".into(),
                actual: "b".into()
            }
            .is_reporting_error()
        );
    }

    #[test]
    fn test_messages_name_the_culprit() {
        let err = MarkerError::Arity {
            node: "sub".into(),
            expected: 2,
            actual: 3,
        };
        assert_eq!(err.to_string(), "'sub' node needs exactly 2 children, got 3");
    }
}
