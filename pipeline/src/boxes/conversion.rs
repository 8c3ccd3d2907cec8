//! Inner boxes reshaping values between types. They emit no tasks; their
//! whole effect happens while planning.

use super::{BoxEnv, BoxType, PlanScope, port};
use crate::error::PipelineError;
use crate::port::Port;
use crate::task::{BoxCategory, TaskDraft};
use crate::variable::{VariableType, VariableValue};

/// A box computing one output array from the items of its inputs.
pub struct ConversionBox {
    pub tag: &'static str,
    pub name: &'static str,
    pub inputs: &'static [(&'static str, VariableType)],
    pub output: (&'static str, VariableType),
    /// Maps the items of every input, in port order, to the output items.
    pub derive: fn(Vec<Vec<String>>) -> Vec<String>,
}

fn concat(inputs: Vec<Vec<String>>) -> Vec<String> {
    inputs.into_iter().flatten().collect()
}

fn file_names(inputs: Vec<Vec<String>>) -> Vec<String> {
    inputs
        .into_iter()
        .flatten()
        .map(|f| f.rsplit('/').next().unwrap_or(&f).to_string())
        .collect()
}

pub static CONVERSION_BOXES: [ConversionBox; 4] = [
    ConversionBox {
        tag: "merge-files",
        name: "merge",
        inputs: &[("in1", VariableType::File), ("in2", VariableType::File)],
        output: ("out", VariableType::FileArray),
        derive: concat,
    },
    ConversionBox {
        tag: "file-to-array",
        name: "to-array",
        inputs: &[("input", VariableType::File)],
        output: ("output", VariableType::FileArray),
        derive: concat,
    },
    ConversionBox {
        tag: "files-names",
        name: "names",
        inputs: &[("files", VariableType::FileArray)],
        output: ("names", VariableType::StringArray),
        derive: file_names,
    },
    ConversionBox {
        tag: "string-to-array",
        name: "to-array",
        inputs: &[("input", VariableType::String)],
        output: ("output", VariableType::StringArray),
        derive: concat,
    },
];

impl BoxType for ConversionBox {
    fn type_tag(&self) -> &'static str {
        self.tag
    }

    fn default_name(&self) -> &'static str {
        self.name
    }

    fn category(&self) -> BoxCategory {
        BoxCategory::Inner
    }

    fn default_input_ports(&self) -> Vec<Port> {
        self.inputs.iter().map(|(n, t)| port(n, *t)).collect()
    }

    fn default_output_ports(&self) -> Vec<Port> {
        vec![port(self.output.0, self.output.1)]
    }

    fn plan(&self, scope: &mut PlanScope<'_>) -> Result<(), PipelineError> {
        let items: Vec<Vec<String>> = self
            .inputs
            .iter()
            .map(|(name, _)| scope.input_items(name))
            .collect();
        if items.iter().all(Vec::is_empty) {
            return Ok(());
        }
        scope.set_output(self.output.0, VariableValue::Array((self.derive)(items)))
    }

    fn compile(&self, _env: &BoxEnv<'_>) -> Result<Vec<TaskDraft>, PipelineError> {
        Ok(Vec::new())
    }
}
