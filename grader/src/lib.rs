//! File-level entry points behind the `grader` binary: each reads JSON
//! documents from disk, runs one engine operation and returns the result
//! as a serializable value.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use marker::EvaluationJob;
use marker::error::MarkerError;
use marker::report::EvaluationReportResponse;
use marker::scoring::ScoreConfig;
use pipeline::{BoxRegistry, CompileRequest, CompiledJob, ExerciseDefinition, compile_exercise};
use serde::de::DeserializeOwned;
use util::paths::WorkingDirs;

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {what} {}", path.display()))
}

fn load_exercise(path: &Path) -> Result<ExerciseDefinition> {
    read_json(path, "exercise")
}

/// Validates every test pipeline of an exercise; returns the test names.
pub fn validate_exercise(path: &Path, registry: &BoxRegistry) -> Result<Vec<String>> {
    let exercise = load_exercise(path)?;
    exercise
        .validate(registry)
        .with_context(|| format!("exercise {} is invalid", path.display()))?;
    Ok(exercise.test_names())
}

/// Per-submission compile options.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub hardware_group: String,
    pub environment: Option<String>,
    pub submission: Vec<String>,
    pub job_id: Option<String>,
    pub working_dirs: WorkingDirs,
}

pub fn compile(path: &Path, options: CompileOptions, registry: &BoxRegistry) -> Result<CompiledJob> {
    let exercise = load_exercise(path)?;
    let mut request = CompileRequest::new(options.hardware_group).with_files(options.submission);
    request.working_dirs = options.working_dirs;
    if let Some(environment) = options.environment {
        request = request.with_environment(environment);
    }
    if let Some(job_id) = options.job_id {
        request = request.with_job_id(job_id);
    }
    compile_exercise(&exercise, &request, registry)
        .with_context(|| format!("compiling {}", path.display()))
}

/// Evaluates a results report against the job it was produced for.
///
/// Without a score file every test weighs the same.
pub fn evaluate(
    job_path: &Path,
    results_path: &Path,
    score_path: Option<&Path>,
) -> Result<EvaluationReportResponse> {
    let job: CompiledJob = read_json(job_path, "job")?;
    let report: serde_json::Value = read_json(results_path, "results report")?;

    let mut evaluation = EvaluationJob::new(&job, report);
    if let Some(score_path) = score_path {
        let config: ScoreConfig = read_json(score_path, "score configuration")?;
        let calculator = config.build(&job.tests).map_err(classify)?;
        evaluation = evaluation.with_boxed_calculator(calculator);
    }
    evaluation.evaluate().map_err(classify)
}

fn classify(err: MarkerError) -> anyhow::Error {
    if err.is_authoring_error() {
        anyhow!(err).context("score configuration is invalid")
    } else {
        anyhow!(err).context("evaluation failed")
    }
}
