//! # Boxes
//!
//! A box is one processing node of a pipeline. Its behaviour comes from its
//! type, a [`BoxType`] looked up by tag in the [`registry::BoxRegistry`];
//! the [`PipelineBox`] instance only carries a name and its port bindings.
//!
//! Compilation is two-phase. [`BoxType::plan`] runs first, over every box in
//! dependency order, and may fill in values of output variables that are
//! still empty (artifact names, derived arrays). [`BoxType::compile`] then
//! sees the fully planned values and emits tasks without mutating anything.
//!
//! The available box types are:
//! - [`data`]: data sources (`file-in`, `files-in`, `submitted-files`, `extract-archive`).
//! - [`toolchain`]: compilation and execution per language.
//! - [`judge`]: built-in and custom judges.
//! - [`conversion`]: fan-in/fan-out and string/array conversions.
//! - [`copy`]: routing files between directories, dumping results.

pub mod conversion;
pub mod copy;
pub mod data;
pub mod judge;
pub mod registry;
pub mod toolchain;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use util::languages::Language;
use util::limits::Limits;
use util::paths::{Directory, WorkingDirs};

use crate::error::PipelineError;
use crate::port::{Port, PortDirection};
use crate::task::{BoxCategory, SandboxSpec, TaskDraft};
use crate::variable::{SubmittedFile, Variable, VariableType, VariableValue, bind_file, file_pattern};

/// One box of a pipeline as authored: name, type tag and port bindings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineBox {
    pub name: String,
    #[serde(rename = "type")]
    pub box_type: String,
    #[serde(default)]
    pub ports_in: Vec<Port>,
    #[serde(default)]
    pub ports_out: Vec<Port>,
}

impl PipelineBox {
    /// An instance of `box_type` carrying its default (unbound) ports.
    pub fn from_type(box_type: &dyn BoxType, name: Option<&str>) -> Self {
        PipelineBox {
            name: name.unwrap_or(box_type.default_name()).to_string(),
            box_type: box_type.type_tag().to_string(),
            ports_in: box_type.default_input_ports(),
            ports_out: box_type.default_output_ports(),
        }
    }

    pub fn input_port(&self, name: &str) -> Option<&Port> {
        self.ports_in.iter().find(|p| p.name == name)
    }

    pub fn output_port(&self, name: &str) -> Option<&Port> {
        self.ports_out.iter().find(|p| p.name == name)
    }

    /// Binds an existing input port; unknown port names are ignored.
    pub fn bind_input(mut self, port: &str, variable: &str) -> Self {
        if let Some(p) = self.ports_in.iter_mut().find(|p| p.name == port) {
            p.bind(variable);
        }
        self
    }

    /// Binds an existing output port; unknown port names are ignored.
    pub fn bind_output(mut self, port: &str, variable: &str) -> Self {
        if let Some(p) = self.ports_out.iter_mut().find(|p| p.name == port) {
            p.bind(variable);
        }
        self
    }

    pub fn ports(&self) -> impl Iterator<Item = (PortDirection, &Port)> {
        self.ports_in
            .iter()
            .map(|p| (PortDirection::Input, p))
            .chain(self.ports_out.iter().map(|p| (PortDirection::Output, p)))
    }
}

/// Behaviour shared by every box type.
pub trait BoxType: Send + Sync {
    /// Registry key, e.g. `"c-compilation"`.
    fn type_tag(&self) -> &'static str;

    fn default_name(&self) -> &'static str;

    fn category(&self) -> BoxCategory;

    fn default_input_ports(&self) -> Vec<Port>;

    fn default_output_ports(&self) -> Vec<Port>;

    /// Whether the emitted tasks run inside the sandbox.
    fn is_sandboxed(&self) -> bool {
        false
    }

    /// Checks that `instance` only overlays this type's default ports: every
    /// configured port must exist on the same side with the same type.
    fn validate(&self, instance: &PipelineBox) -> Result<(), PipelineError> {
        let defaults_in = self.default_input_ports();
        let defaults_out = self.default_output_ports();
        for (direction, port) in instance.ports() {
            let defaults = match direction {
                PortDirection::Input => &defaults_in,
                PortDirection::Output => &defaults_out,
            };
            match defaults.iter().find(|d| d.name == port.name) {
                None => {
                    return Err(PipelineError::UnknownPort {
                        box_name: instance.name.clone(),
                        port: port.name.clone(),
                    });
                }
                Some(default) if default.port_type != port.port_type => {
                    return Err(PipelineError::compilation(
                        &instance.name,
                        &port.name,
                        format!(
                            "port is declared as {}, box type expects {}",
                            port.port_type, default.port_type
                        ),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Fills in values of still-empty output variables.
    fn plan(&self, _scope: &mut PlanScope<'_>) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Emits the tasks of this box. Must not depend on anything but `env`.
    fn compile(&self, env: &BoxEnv<'_>) -> Result<Vec<TaskDraft>, PipelineError>;
}

/// The planned value of one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub var_type: VariableType,
    pub value: VariableValue,
    /// Names supplementary files that still have to be fetched.
    pub remote: bool,
}

/// Planned values of every pipeline variable, by variable name.
pub type ResolvedValues = BTreeMap<String, Binding>;

fn binding_of<'v>(port: Option<&Port>, values: &'v ResolvedValues) -> Option<&'v Binding> {
    port.and_then(Port::binding).and_then(|v| values.get(v))
}

/// What a box sees while planning.
pub struct PlanScope<'a> {
    pub instance: &'a PipelineBox,
    pub language: Option<Language>,
    pub submitted_files: &'a [SubmittedFile],
    values: &'a mut ResolvedValues,
}

impl<'a> PlanScope<'a> {
    pub fn new(
        instance: &'a PipelineBox,
        values: &'a mut ResolvedValues,
        language: Option<Language>,
        submitted_files: &'a [SubmittedFile],
    ) -> Self {
        PlanScope {
            instance,
            language,
            submitted_files,
            values,
        }
    }

    pub fn input(&self, port: &str) -> Option<&Binding> {
        binding_of(self.instance.input_port(port), self.values)
    }

    pub fn input_items(&self, port: &str) -> Vec<String> {
        self.input(port).map(|b| b.value.items()).unwrap_or_default()
    }

    pub fn output(&self, port: &str) -> Option<&Binding> {
        binding_of(self.instance.output_port(port), self.values)
    }

    /// Whether the output port is bound to a variable that has no value yet.
    pub fn output_unset(&self, port: &str) -> bool {
        self.output(port).is_some_and(|b| b.value.is_empty())
    }

    /// Writes the value of an output port's variable. Unbound ports are
    /// skipped: nobody reads them.
    pub fn set_output(&mut self, port: &str, value: VariableValue) -> Result<(), PipelineError> {
        let Some(variable) = self.instance.output_port(port).and_then(Port::binding) else {
            return Ok(());
        };
        let Some(binding) = self.values.get_mut(variable) else {
            return Ok(());
        };
        let value = match (binding.var_type.is_array(), value) {
            (true, VariableValue::Single(s)) => VariableValue::Array(vec![s]),
            (false, VariableValue::Array(items)) if items.len() == 1 => {
                VariableValue::Single(items.into_iter().next().unwrap_or_default())
            }
            (false, VariableValue::Array(_)) => {
                return Err(PipelineError::compilation(
                    &self.instance.name,
                    port,
                    "an array cannot be written to a scalar variable",
                ));
            }
            (_, value) => value,
        };
        tracing::debug!(box_name = %self.instance.name, port, variable, ?value, "planned output");
        binding.value = value;
        binding.remote = false;
        Ok(())
    }

    /// Binds the submitted files matching `pattern` (all of them without
    /// one) to the variable of an output port.
    pub fn bind_submitted(&mut self, port: &str, pattern: Option<&str>) -> Result<(), PipelineError> {
        let Some(variable) = self.instance.output_port(port).and_then(Port::binding) else {
            return Ok(());
        };
        let Some(binding) = self.values.get_mut(variable) else {
            return Ok(());
        };
        let matcher = pattern.map(file_pattern).transpose()?;
        let mut target = Variable::empty(variable, binding.var_type);
        for file in self.submitted_files {
            if matcher.as_ref().is_some_and(|m| !file.matches(m)) {
                continue;
            }
            bind_file(&mut target, file)?;
        }
        binding.value = target.value().clone();
        binding.remote = false;
        Ok(())
    }

    /// Like [`PlanScope::set_output`], but only when the variable is still empty.
    pub fn default_output(&mut self, port: &str, value: VariableValue) -> Result<(), PipelineError> {
        if self.output_unset(port) {
            self.set_output(port, value)?;
        }
        Ok(())
    }
}

/// What a box sees while compiling.
pub struct BoxEnv<'a> {
    pub instance: &'a PipelineBox,
    pub values: &'a ResolvedValues,
    pub dirs: &'a WorkingDirs,
    pub language: Option<Language>,
    pub hardware_group: &'a str,
    /// Resolved limits for sandboxed boxes.
    pub limits: Option<&'a Limits>,
}

impl BoxEnv<'_> {
    fn unbound(&self, port: &str) -> PipelineError {
        PipelineError::compilation(
            &self.instance.name,
            port,
            "required port is unbound and has no value",
        )
    }

    pub fn input(&self, port: &str) -> Option<&Binding> {
        binding_of(self.instance.input_port(port), self.values)
    }

    pub fn output(&self, port: &str) -> Option<&Binding> {
        binding_of(self.instance.output_port(port), self.values)
    }

    /// Non-empty scalar value of an input port.
    pub fn optional_single(&self, port: &str) -> Option<String> {
        self.input(port)
            .and_then(|b| b.value.items().into_iter().next())
    }

    pub fn required_single(&self, port: &str) -> Result<String, PipelineError> {
        self.optional_single(port).ok_or_else(|| self.unbound(port))
    }

    pub fn items(&self, port: &str) -> Vec<String> {
        self.input(port).map(|b| b.value.items()).unwrap_or_default()
    }

    pub fn required_items(&self, port: &str) -> Result<Vec<String>, PipelineError> {
        let items = self.items(port);
        if items.is_empty() {
            return Err(self.unbound(port));
        }
        Ok(items)
    }

    /// Non-empty scalar value of an output port.
    pub fn output_single(&self, port: &str) -> Option<String> {
        self.output(port)
            .and_then(|b| b.value.items().into_iter().next())
    }

    /// A file name placed in the source directory unless already rooted.
    pub fn path(&self, name: &str) -> String {
        self.dirs.join(Directory::Source, name)
    }

    /// The language of the box, or the environment's for generic boxes.
    pub fn language(&self, fixed: Option<Language>) -> Result<Language, PipelineError> {
        language_for(fixed, self.language, &self.instance.name)
    }

    /// Sandbox parameters with the resolved limits of this box.
    pub fn sandbox(&self, stdin: Option<String>, stdout: Option<String>) -> SandboxSpec {
        SandboxSpec {
            limits: self
                .limits
                .cloned()
                .unwrap_or_else(|| Limits::unbounded(self.hardware_group)),
            chdir: self.dirs.root(Directory::Source).to_string(),
            stdin,
            stdout,
            stderr: None,
        }
    }
}

/// A toolchain box's own language, or the environment's for generic boxes.
pub(crate) fn language_for(
    fixed: Option<Language>,
    selected: Option<Language>,
    box_name: &str,
) -> Result<Language, PipelineError> {
    fixed.or(selected).ok_or_else(|| {
        PipelineError::compilation(
            box_name,
            "",
            "no environment selected for a generic toolchain box",
        )
    })
}

/// Shorthand used by box types to declare ports.
pub(crate) fn port(name: &str, port_type: VariableType) -> Port {
    Port::new(name, port_type)
}
