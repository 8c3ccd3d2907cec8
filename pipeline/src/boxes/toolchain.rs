//! Compilation and execution boxes, one pair per language plus a generic
//! pair that takes the language from the selected environment.

use util::languages::{Language, LanguageExt};

use super::{BoxEnv, BoxType, PlanScope, language_for, port};
use crate::error::PipelineError;
use crate::port::Port;
use crate::task::{BoxCategory, TaskDraft};
use crate::variable::{VariableType, VariableValue};

pub struct CompilationBox {
    pub language: Option<Language>,
    pub tag: &'static str,
}

/// Runs a compiled artifact. `input-files` only order the box after their
/// writers; a bound `output-file` is passed to the program as its last
/// argument.
pub struct ExecutionBox {
    pub language: Option<Language>,
    pub tag: &'static str,
}

macro_rules! toolchain_boxes {
    ($kind:ident, $generic:literal, $($lang:ident => $tag:literal),* $(,)?) => {
        [
            $kind { language: None, tag: $generic },
            $($kind { language: Some(Language::$lang), tag: $tag },)*
        ]
    };
}

pub static COMPILATION_BOXES: [CompilationBox; 10] = toolchain_boxes!(
    CompilationBox, "compilation",
    C => "c-compilation",
    Cpp => "cpp-compilation",
    Rust => "rust-compilation",
    Go => "go-compilation",
    Java => "java-compilation",
    CSharp => "csharp-compilation",
    Haskell => "haskell-compilation",
    Python => "python-compilation",
    JavaScript => "javascript-compilation",
);

pub static EXECUTION_BOXES: [ExecutionBox; 10] = toolchain_boxes!(
    ExecutionBox, "execution",
    C => "c-execution",
    Cpp => "cpp-execution",
    Rust => "rust-execution",
    Go => "go-execution",
    Java => "java-execution",
    CSharp => "csharp-execution",
    Haskell => "haskell-execution",
    Python => "python-execution",
    JavaScript => "javascript-execution",
);

/// Artifact name a compilation produces when the author did not name one.
/// Interpreted languages run their main source directly.
fn default_artifact(language: Language, sources: &[String]) -> String {
    if language.is_interpreted() {
        if let Some(first) = sources.first() {
            return first.clone();
        }
    }
    language.artifact_name().to_string()
}

impl BoxType for CompilationBox {
    fn type_tag(&self) -> &'static str {
        self.tag
    }

    fn default_name(&self) -> &'static str {
        "compilation"
    }

    fn category(&self) -> BoxCategory {
        BoxCategory::Initiation
    }

    fn default_input_ports(&self) -> Vec<Port> {
        vec![
            port("source-files", VariableType::FileArray),
            port("extra-files", VariableType::FileArray),
            port("args", VariableType::StringArray),
        ]
    }

    fn default_output_ports(&self) -> Vec<Port> {
        vec![port("binary-file", VariableType::File)]
    }

    fn is_sandboxed(&self) -> bool {
        true
    }

    fn plan(&self, scope: &mut PlanScope<'_>) -> Result<(), PipelineError> {
        if !scope.output_unset("binary-file") {
            return Ok(());
        }
        let language = language_for(self.language, scope.language, &scope.instance.name)?;
        let sources = scope.input_items("source-files");
        scope.set_output(
            "binary-file",
            VariableValue::Single(default_artifact(language, &sources)),
        )
    }

    fn compile(&self, env: &BoxEnv<'_>) -> Result<Vec<TaskDraft>, PipelineError> {
        let language = env.language(self.language)?;
        let mut sources = env.required_items("source-files")?;
        sources.extend(env.items("extra-files"));
        let sources: Vec<String> = sources.iter().map(|s| env.path(s)).collect();

        let artifact = env
            .output_single("binary-file")
            .unwrap_or_else(|| default_artifact(language, &sources));
        let args = language.compile_args(&sources, &env.path(&artifact), &env.items("args"));

        Ok(vec![TaskDraft::sandboxed(
            language.compiler_binary(),
            args,
            env.sandbox(None, None),
        )])
    }
}

impl BoxType for ExecutionBox {
    fn type_tag(&self) -> &'static str {
        self.tag
    }

    fn default_name(&self) -> &'static str {
        "run"
    }

    fn category(&self) -> BoxCategory {
        BoxCategory::Execution
    }

    fn default_input_ports(&self) -> Vec<Port> {
        vec![
            port("binary-file", VariableType::File),
            port("input-files", VariableType::FileArray),
            port("stdin", VariableType::File),
            port("args", VariableType::StringArray),
        ]
    }

    fn default_output_ports(&self) -> Vec<Port> {
        vec![
            port("stdout", VariableType::File),
            port("output-file", VariableType::File),
        ]
    }

    fn is_sandboxed(&self) -> bool {
        true
    }

    fn plan(&self, scope: &mut PlanScope<'_>) -> Result<(), PipelineError> {
        let stdout = format!("{}.out", scope.instance.name);
        scope.default_output("stdout", VariableValue::Single(stdout))
    }

    fn compile(&self, env: &BoxEnv<'_>) -> Result<Vec<TaskDraft>, PipelineError> {
        let language = env.language(self.language)?;
        let binary = env.required_single("binary-file")?;
        let mut program_args = env.items("args");
        program_args.extend(env.output_single("output-file").map(|f| env.path(&f)));
        let (command, args) = language.run_command(&env.path(&binary), &program_args);

        let stdin = env.optional_single("stdin").map(|f| env.path(&f));
        let stdout = env.output_single("stdout").map(|f| env.path(&f));
        Ok(vec![TaskDraft::sandboxed(
            command,
            args,
            env.sandbox(stdin, stdout),
        )])
    }
}
