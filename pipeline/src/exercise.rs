//! Exercise definitions and their compilation into one job per submission.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use util::languages::Language;
use util::limits::ExerciseLimits;
use util::paths::{Directory, WorkingDirs};
use uuid::Uuid;

use crate::boxes::registry::BoxRegistry;
use crate::compiler::{CompileContext, compile_pipeline};
use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use crate::task::{BoxCategory, CompiledJob, Task, commands};
use crate::validator::{validate, validate_remote_files};
use crate::variable::{SubmittedFile, VariableTable};

/// Id of the task creating the working directories.
pub const INIT_TASK_ID: &str = "init.mkdir";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TestDefinition {
    pub name: String,
    /// Names of the pipelines the test runs, in order.
    pub pipelines: Vec<String>,
    #[serde(default)]
    pub variables: VariableTable,
}

/// A runtime environment: a toolchain plus its variables.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EnvironmentDefinition {
    pub language: Language,
    #[serde(default)]
    pub variables: VariableTable,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ExerciseDefinition {
    #[serde(default)]
    pub pipelines: BTreeMap<String, Pipeline>,
    #[serde(default)]
    pub tests: Vec<TestDefinition>,
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentDefinition>,
    #[serde(default)]
    pub limits: ExerciseLimits,
    /// Files uploaded with the exercise, fetchable by remote variables.
    #[serde(default)]
    pub supplementary_files: BTreeSet<String>,
}

impl ExerciseDefinition {
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn test_names(&self) -> Vec<String> {
        self.tests.iter().map(|t| t.name.clone()).collect()
    }

    /// The pipelines of one test joined into one.
    pub fn test_pipeline(&self, test: &TestDefinition) -> Result<Pipeline, PipelineError> {
        let pipelines = test
            .pipelines
            .iter()
            .map(|name| {
                self.pipelines
                    .get(name)
                    .ok_or_else(|| PipelineError::UnknownPipeline {
                        test: test.name.clone(),
                        pipeline: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Pipeline::merge(pipelines)
    }

    /// Checks everything that does not depend on a submission: test names,
    /// limits, and the pipeline of every test.
    pub fn validate(&self, registry: &BoxRegistry) -> Result<(), PipelineError> {
        let mut seen = HashSet::new();
        for test in &self.tests {
            if !seen.insert(test.name.as_str()) {
                return Err(PipelineError::DuplicateTest(test.name.clone()));
            }
        }
        self.limits.check()?;
        for test in &self.tests {
            let pipeline = self.test_pipeline(test)?;
            validate(&pipeline, registry)?;
            validate_remote_files(&pipeline, &self.supplementary_files)?;
        }
        Ok(())
    }
}

/// Per-submission inputs of a compilation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompileRequest {
    pub hardware_group: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub submitted_files: Vec<SubmittedFile>,
    /// Generated when absent.
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub working_dirs: WorkingDirs,
}

impl CompileRequest {
    pub fn new(hardware_group: impl Into<String>) -> Self {
        CompileRequest {
            hardware_group: hardware_group.into(),
            environment: None,
            submitted_files: Vec::new(),
            job_id: None,
            working_dirs: WorkingDirs::default(),
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.submitted_files
            .extend(files.into_iter().map(SubmittedFile::new));
        self
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}

fn init_task(dirs: &WorkingDirs) -> Task {
    Task {
        id: INIT_TASK_ID.to_string(),
        priority: 0,
        command_binary: commands::MKDIR.to_string(),
        arguments: [Directory::Source, Directory::Eval, Directory::Result]
            .into_iter()
            .map(|d| dirs.root(d).to_string())
            .collect(),
        task_type: BoxCategory::Initiation,
        test_id: None,
        sandbox: None,
    }
}

/// Every test must end up with one execution and one evaluation task, the
/// pair its verdict is built from.
fn check_test_structure(test: &str, tasks: &[Task]) -> Result<(), PipelineError> {
    let execution = tasks.iter().filter(|t| t.is_execution()).count();
    let evaluation = tasks.iter().filter(|t| t.is_evaluation()).count();
    if execution != 1 || evaluation != 1 {
        return Err(PipelineError::InvalidTestStructure {
            test: test.to_string(),
            execution,
            evaluation,
        });
    }
    Ok(())
}

/// Compiles every test of `exercise` for one submission.
pub fn compile_exercise(
    exercise: &ExerciseDefinition,
    request: &CompileRequest,
    registry: &BoxRegistry,
) -> Result<CompiledJob, PipelineError> {
    exercise.validate(registry)?;

    let environment = match &request.environment {
        Some(name) => Some(
            exercise
                .environments
                .get(name)
                .ok_or_else(|| PipelineError::UnknownEnvironment(name.clone()))?,
        ),
        None => None,
    };
    let empty = VariableTable::new();
    let env_variables = environment.map(|e| &e.variables).unwrap_or(&empty);
    let job_id = request
        .job_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut tasks = vec![init_task(&request.working_dirs)];
    for test in &exercise.tests {
        let pipeline = exercise.test_pipeline(test)?;
        let external = env_variables.overlay(&test.variables);
        let ctx = CompileContext {
            registry,
            hardware_group: &request.hardware_group,
            language: environment.map(|e| e.language),
            submitted_files: &request.submitted_files,
            external: &external,
            limits: &exercise.limits,
            dirs: &request.working_dirs,
            supplementary_files: &exercise.supplementary_files,
            test_id: Some(&test.name),
        };
        let test_tasks = compile_pipeline(&pipeline, &ctx)?;
        check_test_structure(&test.name, &test_tasks)?;
        tasks.extend(test_tasks);
    }

    let mut ids = HashSet::new();
    for (priority, task) in tasks.iter_mut().enumerate() {
        if !ids.insert(task.id.clone()) {
            return Err(PipelineError::DuplicateTaskId(task.id.clone()));
        }
        task.priority = priority as u32 + 1;
    }

    tracing::info!(
        job_id = %job_id,
        hardware_group = %request.hardware_group,
        tests = exercise.tests.len(),
        tasks = tasks.len(),
        "compiled exercise"
    );
    Ok(CompiledJob {
        job_id,
        hardware_group: request.hardware_group.clone(),
        tests: exercise.test_names(),
        tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXERCISE: &str = r#"{
        "pipelines": {
            "build": {
                "boxes": [
                    {"name": "submission", "type": "submitted-files",
                     "ports_out": [{"name": "output", "type": "file[]", "variable": "sources"}]},
                    {"name": "compile", "type": "compilation",
                     "ports_in": [{"name": "source-files", "type": "file[]", "variable": "sources"}],
                     "ports_out": [{"name": "binary-file", "type": "file", "variable": "binary"}]}
                ],
                "variables": [
                    {"name": "sources", "type": "file[]"},
                    {"name": "binary", "type": "file"}
                ]
            },
            "run": {
                "boxes": [
                    {"name": "input", "type": "file-in",
                     "ports_in": [{"name": "input", "type": "file", "variable": "in-remote"}],
                     "ports_out": [{"name": "output", "type": "file", "variable": "in"}]},
                    {"name": "run", "type": "execution",
                     "ports_in": [
                        {"name": "binary-file", "type": "file", "variable": "binary"},
                        {"name": "stdin", "type": "file", "variable": "in"}
                     ],
                     "ports_out": [{"name": "stdout", "type": "file", "variable": "actual"}]},
                    {"name": "judge", "type": "judge",
                     "ports_in": [
                        {"name": "actual-output", "type": "file", "variable": "actual"},
                        {"name": "expected-output", "type": "file", "variable": "expected"}
                     ]}
                ],
                "variables": [
                    {"name": "binary", "type": "file"},
                    {"name": "in-remote", "type": "file", "value": "$input", "remote": true},
                    {"name": "in", "type": "file"},
                    {"name": "actual", "type": "file"},
                    {"name": "expected", "type": "file", "value": "$expected"}
                ]
            }
        },
        "tests": [
            {"name": "t1", "pipelines": ["build", "run"], "variables": [
                {"name": "input", "type": "file", "value": "1.in"},
                {"name": "expected", "type": "file", "value": "1.out"}
            ]},
            {"name": "t2", "pipelines": ["build", "run"], "variables": [
                {"name": "input", "type": "file", "value": "2.in"},
                {"name": "expected", "type": "file", "value": "2.out"}
            ]}
        ],
        "environments": {
            "c-gcc": {"language": "c"}
        },
        "limits": {
            "group1": {
                "run": {"wall_time": 2.0, "cpu_time": 1.0, "memory": 65536},
                "t2.run": {"wall_time": 4.0, "cpu_time": 2.0, "memory": 65536}
            }
        },
        "supplementary_files": ["1.in", "2.in"]
    }"#;

    fn request() -> CompileRequest {
        CompileRequest::new("group1")
            .with_environment("c-gcc")
            .with_files(["main.c"])
            .with_job_id("job-1")
    }

    #[test]
    fn test_compile_exercise() {
        let exercise = ExerciseDefinition::from_json(EXERCISE).unwrap();
        let job = compile_exercise(&exercise, &request(), &BoxRegistry::standard()).unwrap();

        assert_eq!(job.job_id, "job-1");
        assert_eq!(job.tests, vec!["t1", "t2"]);
        let ids: Vec<&str> = job.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                INIT_TASK_ID,
                "t1.compile",
                "t1.input",
                "t1.run",
                "t1.judge",
                "t2.compile",
                "t2.input",
                "t2.run",
                "t2.judge",
            ]
        );
        assert!(job.tasks.windows(2).all(|w| w[0].priority < w[1].priority));

        let t2_run = job.task("t2.run").unwrap();
        assert_eq!(t2_run.sandbox.as_ref().unwrap().limits.wall_time, 4.0);
        let t1_run = job.task("t1.run").unwrap();
        assert_eq!(t1_run.sandbox.as_ref().unwrap().limits.wall_time, 2.0);
        assert_eq!(job.task("t1.input").unwrap().arguments[0], "1.in");
    }

    #[test]
    fn test_generated_job_id() {
        let exercise = ExerciseDefinition::from_json(EXERCISE).unwrap();
        let mut request = request();
        request.job_id = None;
        let job = compile_exercise(&exercise, &request, &BoxRegistry::standard()).unwrap();
        assert!(Uuid::parse_str(&job.job_id).is_ok());
    }

    #[test]
    fn test_unknown_environment() {
        let exercise = ExerciseDefinition::from_json(EXERCISE).unwrap();
        let request = request().with_environment("cobol");
        assert!(matches!(
            compile_exercise(&exercise, &request, &BoxRegistry::standard()),
            Err(PipelineError::UnknownEnvironment(ref e)) if e == "cobol"
        ));
    }

    #[test]
    fn test_duplicate_test_and_unknown_pipeline() {
        let mut exercise = ExerciseDefinition::from_json(EXERCISE).unwrap();
        exercise.tests[1].name = "t1".into();
        assert!(matches!(
            exercise.validate(&BoxRegistry::standard()),
            Err(PipelineError::DuplicateTest(_))
        ));

        let mut exercise = ExerciseDefinition::from_json(EXERCISE).unwrap();
        exercise.tests[0].pipelines.push("missing".into());
        assert!(matches!(
            exercise.validate(&BoxRegistry::standard()),
            Err(PipelineError::UnknownPipeline { .. })
        ));
    }

    #[test]
    fn test_test_without_judge_is_rejected() {
        let mut exercise = ExerciseDefinition::from_json(EXERCISE).unwrap();
        let run = exercise.pipelines.get_mut("run").unwrap();
        run.boxes.retain(|b| b.name != "judge");
        run.boxes[1].ports_out.clear();
        run.variables = run
            .variables
            .iter()
            .filter(|v| v.name() != "actual" && v.name() != "expected")
            .cloned()
            .collect::<Vec<_>>()
            .try_into()
            .unwrap();
        let err = compile_exercise(&exercise, &request(), &BoxRegistry::standard()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidTestStructure { execution: 1, evaluation: 0, .. }
        ));
    }
}
