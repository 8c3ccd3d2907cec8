//! Compiler output: primitive tasks the worker executes in order.

use serde::{Deserialize, Serialize};
use util::limits::Limits;

/// Stage a box (and every task it emits) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxCategory {
    Initiation,
    Execution,
    Evaluation,
    Inner,
}

/// Built-in worker commands. Toolchain tasks name their binary directly.
pub mod commands {
    pub const COPY: &str = "cp";
    pub const FETCH: &str = "fetch";
    pub const MKDIR: &str = "mkdir";
    pub const EXTRACT: &str = "extract";
    pub const DUMP_DIR: &str = "dumpdir";
}

/// How a sandboxed task is run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SandboxSpec {
    pub limits: Limits,
    pub chdir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Task {
    pub id: String,
    pub priority: u32,
    pub command_binary: String,
    pub arguments: Vec<String>,
    pub task_type: BoxCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<SandboxSpec>,
}

impl Task {
    pub fn is_execution(&self) -> bool {
        self.task_type == BoxCategory::Execution
    }

    pub fn is_evaluation(&self) -> bool {
        self.task_type == BoxCategory::Evaluation
    }
}

/// A task as a box emits it, before the compiler assigns id and priority.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub command_binary: String,
    pub arguments: Vec<String>,
    pub sandbox: Option<SandboxSpec>,
}

impl TaskDraft {
    pub fn command(binary: &str, arguments: Vec<String>) -> Self {
        TaskDraft {
            command_binary: binary.to_string(),
            arguments,
            sandbox: None,
        }
    }

    pub fn sandboxed(binary: impl Into<String>, arguments: Vec<String>, sandbox: SandboxSpec) -> Self {
        TaskDraft {
            command_binary: binary.into(),
            arguments,
            sandbox: Some(sandbox),
        }
    }
}

/// The compiled form of one graded submission.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompiledJob {
    pub job_id: String,
    pub hardware_group: String,
    /// Declared tests, in definition order.
    pub tests: Vec<String>,
    pub tasks: Vec<Task>,
}

impl CompiledJob {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks of one test, in job order.
    pub fn tasks_of<'a>(&'a self, test: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks
            .iter()
            .filter(move |t| t.test_id.as_deref() == Some(test))
    }
}
