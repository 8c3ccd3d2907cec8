//! Evaluation boxes. A judge compares the output of the execution with the
//! reference output and prints a score (or nothing) on stdout.

use serde::{Deserialize, Serialize};

use super::{BoxEnv, BoxType, port};
use crate::error::PipelineError;
use crate::port::Port;
use crate::task::{BoxCategory, TaskDraft};
use crate::variable::VariableType;

/// Binary of the built-in judge shipped with the worker.
pub const JUDGE_BINARY: &str = "judge";

/// Comparison modes of the built-in judge, selected by the `judge-type` port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeKind {
    /// Whitespace-separated tokens must match.
    #[default]
    Token,
    /// Files must be byte-identical.
    Exact,
    /// Tokens are compared as floats with a tolerance.
    Float,
    /// Score is the share of matching lines.
    Percentage,
    /// Every reference line is a regular expression the output must match.
    Regex,
}

impl JudgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JudgeKind::Token => "token",
            JudgeKind::Exact => "exact",
            JudgeKind::Float => "float",
            JudgeKind::Percentage => "percentage",
            JudgeKind::Regex => "regex",
        }
    }

    pub fn parse(value: &str) -> Option<JudgeKind> {
        [
            JudgeKind::Token,
            JudgeKind::Exact,
            JudgeKind::Float,
            JudgeKind::Percentage,
            JudgeKind::Regex,
        ]
        .into_iter()
        .find(|k| k.as_str() == value)
    }
}

/// `judge`: the built-in judge.
pub struct JudgeBox;

impl BoxType for JudgeBox {
    fn type_tag(&self) -> &'static str {
        "judge"
    }

    fn default_name(&self) -> &'static str {
        "judge"
    }

    fn category(&self) -> BoxCategory {
        BoxCategory::Evaluation
    }

    fn default_input_ports(&self) -> Vec<Port> {
        vec![
            port("judge-type", VariableType::String),
            port("actual-output", VariableType::File),
            port("expected-output", VariableType::File),
            port("args", VariableType::StringArray),
        ]
    }

    fn default_output_ports(&self) -> Vec<Port> {
        Vec::new()
    }

    fn is_sandboxed(&self) -> bool {
        true
    }

    fn compile(&self, env: &BoxEnv<'_>) -> Result<Vec<TaskDraft>, PipelineError> {
        let kind = match env.optional_single("judge-type") {
            None => JudgeKind::default(),
            Some(value) => JudgeKind::parse(&value).ok_or_else(|| {
                PipelineError::compilation(
                    &env.instance.name,
                    "judge-type",
                    format!("unknown judge type '{value}'"),
                )
            })?,
        };
        let expected = env.required_single("expected-output")?;
        let actual = env.required_single("actual-output")?;

        let mut args = vec!["--mode".to_string(), kind.as_str().to_string()];
        args.extend(env.items("args"));
        args.push(env.path(&expected));
        args.push(env.path(&actual));
        Ok(vec![TaskDraft::sandboxed(
            JUDGE_BINARY,
            args,
            env.sandbox(None, None),
        )])
    }
}

/// `custom-judge`: a judge binary supplied with the exercise.
pub struct CustomJudgeBox;

impl BoxType for CustomJudgeBox {
    fn type_tag(&self) -> &'static str {
        "custom-judge"
    }

    fn default_name(&self) -> &'static str {
        "custom-judge"
    }

    fn category(&self) -> BoxCategory {
        BoxCategory::Evaluation
    }

    fn default_input_ports(&self) -> Vec<Port> {
        vec![
            port("custom-judge", VariableType::File),
            port("actual-output", VariableType::File),
            port("expected-output", VariableType::File),
            port("judge-args", VariableType::StringArray),
        ]
    }

    fn default_output_ports(&self) -> Vec<Port> {
        Vec::new()
    }

    fn is_sandboxed(&self) -> bool {
        true
    }

    fn compile(&self, env: &BoxEnv<'_>) -> Result<Vec<TaskDraft>, PipelineError> {
        let judge = env.required_single("custom-judge")?;
        let expected = env.required_single("expected-output")?;
        let actual = env.required_single("actual-output")?;

        let mut args = env.items("judge-args");
        args.push(env.path(&expected));
        args.push(env.path(&actual));
        Ok(vec![TaskDraft::sandboxed(
            env.path(&judge),
            args,
            env.sandbox(None, None),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::{Binding, PipelineBox, ResolvedValues};
    use crate::variable::VariableValue;
    use util::paths::WorkingDirs;

    fn values(entries: &[(&str, VariableType, &str)]) -> ResolvedValues {
        entries
            .iter()
            .map(|(n, t, v)| {
                (
                    n.to_string(),
                    Binding {
                        var_type: *t,
                        value: VariableValue::Single(v.to_string()),
                        remote: false,
                    },
                )
            })
            .collect()
    }

    fn judge_instance() -> PipelineBox {
        PipelineBox::from_type(&JudgeBox, None)
            .bind_input("judge-type", "mode")
            .bind_input("actual-output", "actual")
            .bind_input("expected-output", "expected")
    }

    #[test]
    fn test_judge_arguments() {
        let instance = judge_instance();
        let values = values(&[
            ("mode", VariableType::String, "float"),
            ("actual", VariableType::File, "run.out"),
            ("expected", VariableType::File, "01.out"),
        ]);
        let dirs = WorkingDirs::default();
        let env = BoxEnv {
            instance: &instance,
            values: &values,
            dirs: &dirs,
            language: None,
            hardware_group: "group1",
            limits: None,
        };
        let tasks = JudgeBox.compile(&env).unwrap();
        assert_eq!(tasks[0].command_binary, JUDGE_BINARY);
        assert_eq!(
            tasks[0].arguments,
            vec!["--mode", "float", "${SOURCE_DIR}/01.out", "${SOURCE_DIR}/run.out"]
        );
    }

    #[test]
    fn test_unknown_judge_type() {
        let instance = judge_instance();
        let values = values(&[
            ("mode", VariableType::String, "fuzzy"),
            ("actual", VariableType::File, "run.out"),
            ("expected", VariableType::File, "01.out"),
        ]);
        let dirs = WorkingDirs::default();
        let env = BoxEnv {
            instance: &instance,
            values: &values,
            dirs: &dirs,
            language: None,
            hardware_group: "group1",
            limits: None,
        };
        let err = JudgeBox.compile(&env).unwrap_err();
        assert!(err.to_string().contains("fuzzy"));
    }

    #[test]
    fn test_judge_kind_names() {
        assert_eq!(JudgeKind::parse("regex"), Some(JudgeKind::Regex));
        assert_eq!(JudgeKind::parse("Token"), None);
        assert_eq!(JudgeKind::default().as_str(), "token");
    }
}
