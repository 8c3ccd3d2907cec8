//! # Pipeline Library
//!
//! Typed data-flow pipelines and their compilation into worker tasks.
//!
//! ## Key Concepts
//! - **Variable**: a named, typed value (`string`, `string[]`, `file`, `file[]`),
//!   either a literal or a `$reference` into the test/environment variables.
//! - **Box**: a processing node whose type (compilation, execution, judge, ...)
//!   is looked up in a [`BoxRegistry`] by tag. Its ports bind variables.
//! - **Pipeline**: boxes plus variables. [`validate`] enforces one writer and
//!   at least one reader per variable and matching port types.
//! - **Compilation**: [`compile_exercise`] plans and compiles the pipelines of
//!   every test into one [`CompiledJob`] of prioritized [`Task`]s.

pub mod boxes;
pub mod compiler;
pub mod error;
pub mod exercise;
pub mod graph;
pub mod pipeline;
pub mod port;
pub mod task;
pub mod validator;
pub mod variable;

pub use boxes::registry::BoxRegistry;
pub use compiler::{CompileContext, compile_pipeline};
pub use error::PipelineError;
pub use exercise::{CompileRequest, ExerciseDefinition, compile_exercise};
pub use pipeline::Pipeline;
pub use task::{BoxCategory, CompiledJob, SandboxSpec, Task};
pub use validator::validate;
pub use variable::{SubmittedFile, Variable, VariableTable, VariableType, VariableValue};
