use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::boxes::PipelineBox;
use crate::error::PipelineError;
use crate::variable::{Variable, VariableTable};

/// An authored list of boxes plus the variables flowing between them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Pipeline {
    #[serde(default)]
    pub boxes: Vec<PipelineBox>,
    #[serde(default)]
    pub variables: VariableTable,
}

/// A port, identified by box and port name, touching a variable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PortRef {
    /// Position of the box in the authored list.
    pub box_index: usize,
    pub box_name: String,
    pub port: String,
}

impl std::fmt::Display for PortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.box_name, self.port)
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_box(mut self, instance: PipelineBox) -> Self {
        self.boxes.push(instance);
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Result<Self, PipelineError> {
        self.variables.add(variable)?;
        Ok(self)
    }

    /// Joins the pipelines a test runs. Boxes are concatenated; variables of
    /// the same name are shared and must have the same type, a non-empty
    /// value winning over an empty one.
    pub fn merge<'a, I>(pipelines: I) -> Result<Pipeline, PipelineError>
    where
        I: IntoIterator<Item = &'a Pipeline>,
    {
        let mut merged = Pipeline::new();
        for pipeline in pipelines {
            merged.boxes.extend(pipeline.boxes.iter().cloned());
            for variable in pipeline.variables.iter() {
                match merged.variables.get(variable.name()) {
                    None => merged.variables.set(variable.clone()),
                    Some(existing) if existing.var_type() != variable.var_type() => {
                        return Err(PipelineError::TypeMismatch {
                            variable: variable.name().to_string(),
                            expected: existing.var_type(),
                            actual: variable.var_type(),
                        });
                    }
                    Some(existing) if existing.is_empty() && !variable.is_empty() => {
                        merged.variables.set(variable.clone());
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(merged)
    }

    pub fn find_box(&self, name: &str) -> Option<&PipelineBox> {
        self.boxes.iter().find(|b| b.name == name)
    }

    /// Output ports writing each variable, by variable name.
    pub fn writers(&self) -> BTreeMap<&str, Vec<PortRef>> {
        self.bindings(|b| &b.ports_out)
    }

    /// Input ports reading each variable, by variable name.
    pub fn readers(&self) -> BTreeMap<&str, Vec<PortRef>> {
        self.bindings(|b| &b.ports_in)
    }

    fn bindings<'a, F>(&'a self, side: F) -> BTreeMap<&'a str, Vec<PortRef>>
    where
        F: Fn(&'a PipelineBox) -> &'a Vec<crate::port::Port>,
    {
        let mut map: BTreeMap<&str, Vec<PortRef>> = BTreeMap::new();
        for (box_index, instance) in self.boxes.iter().enumerate() {
            for port in side(instance) {
                if let Some(variable) = port.binding() {
                    map.entry(variable).or_default().push(PortRef {
                        box_index,
                        box_name: instance.name.clone(),
                        port: port.name.clone(),
                    });
                }
            }
        }
        map
    }
}
