//! Pipeline Error Types
//!
//! Every variant here is an authoring error: the exercise definition is
//! broken and must be fixed by its author. Each variant names the box, port,
//! variable or test at fault. None of them may reach the worker.

use crate::variable::VariableType;
use util::limits::LimitsError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("variable '{variable}' references '{reference}', which is not defined")]
    UnresolvedReference { variable: String, reference: String },

    #[error("variable '{variable}' is of type {actual}, expected {expected}")]
    TypeMismatch {
        variable: String,
        expected: VariableType,
        actual: VariableType,
    },

    #[error("value of variable '{variable}' does not fit its type {var_type}")]
    InvalidValue {
        variable: String,
        var_type: VariableType,
    },

    #[error("variable '{0}' is defined more than once")]
    DuplicateVariable(String),

    #[error("box '{0}' is defined more than once")]
    DuplicateBox(String),

    #[error("box '{box_name}' has unknown type '{box_type}'")]
    UnknownBoxType { box_name: String, box_type: String },

    #[error("box '{box_name}' declares port '{port}', which its type does not have")]
    UnknownPort { box_name: String, port: String },

    #[error("port '{port}' of box '{box_name}' is bound to unknown variable '{variable}'")]
    UnknownVariable {
        box_name: String,
        port: String,
        variable: String,
    },

    #[error(
        "port '{port}' of box '{box_name}' is of type {port_type}, but variable '{variable}' is of type {variable_type}"
    )]
    PortTypeMismatch {
        box_name: String,
        port: String,
        port_type: VariableType,
        variable: String,
        variable_type: VariableType,
    },

    #[error("variable '{variable}' is written by more than one port: {}", .writers.join(", "))]
    MultipleWriters {
        variable: String,
        writers: Vec<String>,
    },

    #[error("variable '{0}' is never written and has no default value")]
    NoWriter(String),

    #[error("variable '{0}' is never read")]
    UnusedVariable(String),

    #[error("variable '{variable}' refers to supplementary file '{file}', which does not exist")]
    MissingRemoteFile { variable: String, file: String },

    #[error("invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("cannot compile box '{box_name}', port '{port}': {message}")]
    ExerciseCompilation {
        box_name: String,
        port: String,
        message: String,
    },

    #[error("boxes form a dependency cycle: {}", .boxes.join(" -> "))]
    CyclicDependency { boxes: Vec<String> },

    #[error("test '{test}' uses unknown pipeline '{pipeline}'")]
    UnknownPipeline { test: String, pipeline: String },

    #[error("unknown environment '{0}'")]
    UnknownEnvironment(String),

    #[error("test '{0}' is defined more than once")]
    DuplicateTest(String),

    #[error("task id '{0}' is produced more than once")]
    DuplicateTaskId(String),

    #[error(
        "test '{test}' must compile to exactly one execution and one evaluation task, got {execution} and {evaluation}"
    )]
    InvalidTestStructure {
        test: String,
        execution: usize,
        evaluation: usize,
    },

    #[error(transparent)]
    Limits(#[from] LimitsError),

    #[error("invalid pipeline JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn compilation(
        box_name: impl Into<String>,
        port: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        PipelineError::ExerciseCompilation {
            box_name: box_name.into(),
            port: port.into(),
            message: message.into(),
        }
    }
}
