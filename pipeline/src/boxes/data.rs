//! Data sources: files entering the job from the exercise, the submission,
//! or an archive.

use super::{BoxEnv, BoxType, PlanScope, port};
use crate::error::PipelineError;
use crate::port::Port;
use crate::task::{BoxCategory, TaskDraft, commands};
use crate::variable::{VariableType, VariableValue};

/// Last path component of a file name.
fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// One task bringing `input` to `output`: a `fetch` for a supplementary
/// file, a `cp` for a local one, nothing when both are the same file.
fn transfer(env: &BoxEnv<'_>, input: &str, output: &str, remote: bool) -> Option<TaskDraft> {
    let target = env.path(output);
    if remote {
        return Some(TaskDraft::command(
            commands::FETCH,
            vec![input.to_string(), target],
        ));
    }
    let source = env.path(input);
    if source == target {
        return None;
    }
    Some(TaskDraft::command(commands::COPY, vec![source, target]))
}

/// `file-in`: a single exercise or submission file.
pub struct FileInBox;

impl BoxType for FileInBox {
    fn type_tag(&self) -> &'static str {
        "file-in"
    }

    fn default_name(&self) -> &'static str {
        "file-in"
    }

    fn category(&self) -> BoxCategory {
        BoxCategory::Initiation
    }

    fn default_input_ports(&self) -> Vec<Port> {
        vec![port("input", VariableType::File)]
    }

    fn default_output_ports(&self) -> Vec<Port> {
        vec![port("output", VariableType::File)]
    }

    fn plan(&self, scope: &mut PlanScope<'_>) -> Result<(), PipelineError> {
        let Some(input) = scope.input_items("input").into_iter().next() else {
            return Ok(());
        };
        scope.default_output("output", VariableValue::Single(file_name(&input).to_string()))
    }

    fn compile(&self, env: &BoxEnv<'_>) -> Result<Vec<TaskDraft>, PipelineError> {
        let input = env.required_single("input")?;
        let remote = env.input("input").is_some_and(|b| b.remote);
        let output = env
            .output_single("output")
            .unwrap_or_else(|| file_name(&input).to_string());
        Ok(transfer(env, &input, &output, remote).into_iter().collect())
    }
}

/// `files-in`: several exercise or submission files, one task per file.
pub struct FilesInBox;

impl BoxType for FilesInBox {
    fn type_tag(&self) -> &'static str {
        "files-in"
    }

    fn default_name(&self) -> &'static str {
        "files-in"
    }

    fn category(&self) -> BoxCategory {
        BoxCategory::Initiation
    }

    fn default_input_ports(&self) -> Vec<Port> {
        vec![port("input", VariableType::FileArray)]
    }

    fn default_output_ports(&self) -> Vec<Port> {
        vec![port("output", VariableType::FileArray)]
    }

    fn plan(&self, scope: &mut PlanScope<'_>) -> Result<(), PipelineError> {
        let names: Vec<String> = scope
            .input_items("input")
            .iter()
            .map(|f| file_name(f).to_string())
            .collect();
        if names.is_empty() {
            return Ok(());
        }
        scope.default_output("output", VariableValue::Array(names))
    }

    fn compile(&self, env: &BoxEnv<'_>) -> Result<Vec<TaskDraft>, PipelineError> {
        let inputs = env.required_items("input")?;
        let remote = env.input("input").is_some_and(|b| b.remote);
        let outputs = env.output("output").map(|b| b.value.items()).unwrap_or_default();
        if !outputs.is_empty() && outputs.len() != inputs.len() {
            return Err(PipelineError::compilation(
                &env.instance.name,
                "output",
                format!("{} inputs but {} outputs", inputs.len(), outputs.len()),
            ));
        }

        let mut tasks = Vec::new();
        for (i, input) in inputs.iter().enumerate() {
            let output = outputs
                .get(i)
                .cloned()
                .unwrap_or_else(|| file_name(input).to_string());
            tasks.extend(transfer(env, input, &output, remote));
        }
        Ok(tasks)
    }
}

/// `submitted-files`: exposes the files of the submission. Emits no tasks;
/// the worker receives the submission in the source directory. A `pattern`
/// such as `*.c` keeps only the matching files.
pub struct SubmittedFilesBox;

impl BoxType for SubmittedFilesBox {
    fn type_tag(&self) -> &'static str {
        "submitted-files"
    }

    fn default_name(&self) -> &'static str {
        "submission"
    }

    fn category(&self) -> BoxCategory {
        BoxCategory::Initiation
    }

    fn default_input_ports(&self) -> Vec<Port> {
        vec![port("pattern", VariableType::String)]
    }

    fn default_output_ports(&self) -> Vec<Port> {
        vec![port("output", VariableType::FileArray)]
    }

    fn plan(&self, scope: &mut PlanScope<'_>) -> Result<(), PipelineError> {
        let pattern = scope
            .input("pattern")
            .and_then(|b| b.value.as_single().map(str::to_string))
            .filter(|p| !p.is_empty());
        scope.bind_submitted("output", pattern.as_deref())
    }

    fn compile(&self, _env: &BoxEnv<'_>) -> Result<Vec<TaskDraft>, PipelineError> {
        Ok(Vec::new())
    }
}

/// `extract-archive`: unpacks an archive into a directory of the source tree.
pub struct ExtractArchiveBox;

pub const DEFAULT_EXTRACT_DIR: &str = "extracted";

impl BoxType for ExtractArchiveBox {
    fn type_tag(&self) -> &'static str {
        "extract-archive"
    }

    fn default_name(&self) -> &'static str {
        "extract"
    }

    fn category(&self) -> BoxCategory {
        BoxCategory::Initiation
    }

    fn default_input_ports(&self) -> Vec<Port> {
        vec![port("archive", VariableType::File)]
    }

    fn default_output_ports(&self) -> Vec<Port> {
        vec![port("directory", VariableType::String)]
    }

    fn plan(&self, scope: &mut PlanScope<'_>) -> Result<(), PipelineError> {
        scope.default_output(
            "directory",
            VariableValue::Single(DEFAULT_EXTRACT_DIR.to_string()),
        )
    }

    fn compile(&self, env: &BoxEnv<'_>) -> Result<Vec<TaskDraft>, PipelineError> {
        let archive = env.required_single("archive")?;
        let directory = env
            .output_single("directory")
            .unwrap_or_else(|| DEFAULT_EXTRACT_DIR.to_string());
        Ok(vec![TaskDraft::command(
            commands::EXTRACT,
            vec![env.path(&archive), env.path(&directory)],
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::{Binding, PipelineBox, PlanScope, ResolvedValues};
    use crate::variable::SubmittedFile;
    use util::paths::WorkingDirs;

    fn values(entries: &[(&str, VariableType, VariableValue, bool)]) -> ResolvedValues {
        entries
            .iter()
            .map(|(name, var_type, value, remote)| {
                (
                    name.to_string(),
                    Binding {
                        var_type: *var_type,
                        value: value.clone(),
                        remote: *remote,
                    },
                )
            })
            .collect()
    }

    fn env<'a>(
        instance: &'a PipelineBox,
        values: &'a ResolvedValues,
        dirs: &'a WorkingDirs,
    ) -> BoxEnv<'a> {
        BoxEnv {
            instance,
            values,
            dirs,
            language: None,
            hardware_group: "group1",
            limits: None,
        }
    }

    #[test]
    fn test_remote_file_is_fetched() {
        let instance = PipelineBox::from_type(&FileInBox, None)
            .bind_input("input", "in")
            .bind_output("output", "out");
        let values = values(&[
            ("in", VariableType::File, VariableValue::Single("test.in".into()), true),
            ("out", VariableType::File, VariableValue::Single("test.in".into()), false),
        ]);
        let dirs = WorkingDirs::default();
        let tasks = FileInBox.compile(&env(&instance, &values, &dirs)).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].command_binary, commands::FETCH);
        assert_eq!(tasks[0].arguments, vec!["test.in", "${SOURCE_DIR}/test.in"]);
    }

    #[test]
    fn test_local_file_in_place_is_noop() {
        let instance = PipelineBox::from_type(&FileInBox, None)
            .bind_input("input", "in")
            .bind_output("output", "out");
        let values = values(&[
            ("in", VariableType::File, VariableValue::Single("main.c".into()), false),
            ("out", VariableType::File, VariableValue::Single("main.c".into()), false),
        ]);
        let dirs = WorkingDirs::default();
        assert!(FileInBox.compile(&env(&instance, &values, &dirs)).unwrap().is_empty());
    }

    #[test]
    fn test_files_in_one_task_per_file() {
        let instance = PipelineBox::from_type(&FilesInBox, None).bind_input("input", "in");
        let values = values(&[(
            "in",
            VariableType::FileArray,
            VariableValue::Array(vec!["a.txt".into(), "b.txt".into()]),
            true,
        )]);
        let dirs = WorkingDirs::default();
        let tasks = FilesInBox.compile(&env(&instance, &values, &dirs)).unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.command_binary == commands::FETCH));
    }

    #[test]
    fn test_missing_input_names_box_and_port() {
        let instance = PipelineBox::from_type(&FileInBox, Some("data"));
        let values = ResolvedValues::new();
        let dirs = WorkingDirs::default();
        let err = FileInBox.compile(&env(&instance, &values, &dirs)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ExerciseCompilation { ref box_name, ref port, .. }
                if box_name == "data" && port == "input"
        ));
    }

    #[test]
    fn test_extract_into_default_directory() {
        let instance = PipelineBox::from_type(&ExtractArchiveBox, None).bind_input("archive", "zip");
        let values = values(&[(
            "zip",
            VariableType::File,
            VariableValue::Single("solution.zip".into()),
            false,
        )]);
        let dirs = WorkingDirs::default();
        let tasks = ExtractArchiveBox.compile(&env(&instance, &values, &dirs)).unwrap();
        assert_eq!(
            tasks[0].arguments,
            vec!["${SOURCE_DIR}/solution.zip", "${SOURCE_DIR}/extracted"]
        );
    }

    #[test]
    fn test_submission_filtered_by_pattern() {
        let submitted = vec![
            SubmittedFile::new("main.c"),
            SubmittedFile::new("util.h"),
            SubmittedFile::new("util.c"),
        ];
        let instance = PipelineBox::from_type(&SubmittedFilesBox, None)
            .bind_input("pattern", "glob")
            .bind_output("output", "sources");
        let mut planned = values(&[
            ("glob", VariableType::String, VariableValue::Single("*.c".into()), false),
            ("sources", VariableType::FileArray, VariableValue::Array(vec![]), false),
        ]);
        let mut scope = PlanScope::new(&instance, &mut planned, None, &submitted);
        SubmittedFilesBox.plan(&mut scope).unwrap();
        assert_eq!(
            planned["sources"].value,
            VariableValue::Array(vec!["main.c".into(), "util.c".into()])
        );

        let unfiltered = PipelineBox::from_type(&SubmittedFilesBox, None).bind_output("output", "sources");
        let mut scope = PlanScope::new(&unfiltered, &mut planned, None, &submitted);
        SubmittedFilesBox.plan(&mut scope).unwrap();
        assert_eq!(planned["sources"].value.items().len(), 3);
    }

    #[test]
    fn test_submission_pattern_with_character_class() {
        let submitted = vec![
            SubmittedFile::new("main.c"),
            SubmittedFile::new("util.h"),
            SubmittedFile::new("notes.txt"),
        ];
        let instance = PipelineBox::from_type(&SubmittedFilesBox, None)
            .bind_input("pattern", "glob")
            .bind_output("output", "sources");
        let mut planned = values(&[
            ("glob", VariableType::String, VariableValue::Single("*.[ch]".into()), false),
            ("sources", VariableType::FileArray, VariableValue::Array(vec![]), false),
        ]);
        let mut scope = PlanScope::new(&instance, &mut planned, None, &submitted);
        SubmittedFilesBox.plan(&mut scope).unwrap();
        assert_eq!(
            planned["sources"].value,
            VariableValue::Array(vec!["main.c".into(), "util.h".into()])
        );

        planned.get_mut("glob").unwrap().value = VariableValue::Single("[".into());
        let mut scope = PlanScope::new(&instance, &mut planned, None, &submitted);
        assert!(matches!(
            SubmittedFilesBox.plan(&mut scope),
            Err(PipelineError::InvalidPattern { ref pattern, .. }) if pattern == "["
        ));
    }
}
