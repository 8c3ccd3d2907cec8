//! Boxes moving files between the working directories.

use util::paths::Directory;

use super::{BoxEnv, BoxType, PlanScope, port};
use crate::error::PipelineError;
use crate::port::Port;
use crate::task::{BoxCategory, TaskDraft, commands};
use crate::variable::VariableType;

/// `copy-file` (`file`) and `copy-files` (`file[]`).
///
/// An unset destination defaults to the source, so a copy whose two sides
/// denote the same location, or whose sides are both empty, emits nothing.
pub struct CopyBox {
    pub tag: &'static str,
    pub var_type: VariableType,
}

pub static COPY_FILE: CopyBox = CopyBox {
    tag: "copy-file",
    var_type: VariableType::File,
};

pub static COPY_FILES: CopyBox = CopyBox {
    tag: "copy-files",
    var_type: VariableType::FileArray,
};

impl BoxType for CopyBox {
    fn type_tag(&self) -> &'static str {
        self.tag
    }

    fn default_name(&self) -> &'static str {
        "copy"
    }

    fn category(&self) -> BoxCategory {
        BoxCategory::Inner
    }

    fn default_input_ports(&self) -> Vec<Port> {
        vec![port("in", self.var_type)]
    }

    fn default_output_ports(&self) -> Vec<Port> {
        vec![port("out", self.var_type)]
    }

    fn plan(&self, scope: &mut PlanScope<'_>) -> Result<(), PipelineError> {
        let Some(input) = scope.input("in").map(|b| b.value.clone()) else {
            return Ok(());
        };
        if input.is_empty() {
            return Ok(());
        }
        scope.default_output("out", input)
    }

    fn compile(&self, env: &BoxEnv<'_>) -> Result<Vec<TaskDraft>, PipelineError> {
        let targets = env.output("out").map(|b| b.value.items()).unwrap_or_default();
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        let sources = env.required_items("in")?;
        if sources.len() != targets.len() {
            return Err(PipelineError::compilation(
                &env.instance.name,
                "out",
                format!("{} sources but {} destinations", sources.len(), targets.len()),
            ));
        }

        let tasks = sources
            .iter()
            .zip(&targets)
            .map(|(from, to)| (env.path(from), env.path(to)))
            .filter(|(from, to)| from != to)
            .map(|(from, to)| TaskDraft::command(commands::COPY, vec![from, to]))
            .collect();
        Ok(tasks)
    }
}

/// `dump-results`: returns a directory with the results for inspection.
pub struct DumpResultsBox;

impl BoxType for DumpResultsBox {
    fn type_tag(&self) -> &'static str {
        "dump-results"
    }

    fn default_name(&self) -> &'static str {
        "dump"
    }

    fn category(&self) -> BoxCategory {
        BoxCategory::Inner
    }

    fn default_input_ports(&self) -> Vec<Port> {
        vec![port("directory", VariableType::String)]
    }

    fn default_output_ports(&self) -> Vec<Port> {
        Vec::new()
    }

    fn compile(&self, env: &BoxEnv<'_>) -> Result<Vec<TaskDraft>, PipelineError> {
        let source = match env.optional_single("directory") {
            Some(dir) => env.path(&dir),
            None => env.dirs.root(Directory::Source).to_string(),
        };
        let target = env.dirs.join(Directory::Result, &env.instance.name);
        Ok(vec![TaskDraft::command(commands::DUMP_DIR, vec![source, target])])
    }
}
