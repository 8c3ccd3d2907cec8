//! # Types Module
//!
//! Per-task outcomes as the worker reports them, and per-test verdicts as
//! the aggregation produces them.

use serde::{Deserialize, Serialize};
use util::limits::LimitsVerdict;
use util::sandbox::SandboxStats;

/// Outcome of one task on the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Ok,
    Failed,
    /// Not run, usually because an earlier task failed.
    Skipped,
}

/// One entry of a results report.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskStatus,
    /// Text the task printed, e.g. a judge's score line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Sandbox statistics; required for execution tasks that ran.
    #[serde(default, rename = "sandbox_results", skip_serializing_if = "Option::is_none")]
    pub stats: Option<SandboxStats>,
}

impl TaskResult {
    pub fn new(task_id: impl Into<String>, status: TaskStatus) -> Self {
        TaskResult {
            task_id: task_id.into(),
            status,
            output: None,
            stats: None,
        }
    }

    /// A result standing in for a task the worker never reported.
    pub fn skipped(task_id: impl Into<String>) -> Self {
        TaskResult::new(task_id, TaskStatus::Skipped)
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_stats(mut self, stats: SandboxStats) -> Self {
        self.stats = Some(stats);
        self
    }
}

/// A parsed results report.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResultsReport {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<TaskResult>,
}

impl ResultsReport {
    pub fn result(&self, task_id: &str) -> Option<&TaskResult> {
        self.results.iter().find(|r| r.task_id == task_id)
    }
}

/// Verdict of one test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Ok,
    Failed,
    Skipped,
}

/// Why a test ended up with its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestOutcome {
    Passed,
    /// The judge rejected the output.
    WrongAnswer,
    ExecutionFailed,
    LimitsExceeded,
    EvaluationSkipped,
    ExecutionSkipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub test_id: String,
    pub status: TestStatus,
    pub outcome: TestOutcome,
    /// In `[0, 1]`; always 0 unless `status` is OK.
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<LimitsVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exitcode: Option<i32>,
}
