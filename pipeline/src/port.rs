use serde::{Deserialize, Serialize};

use crate::variable::VariableType;

/// A named, typed socket of a box, optionally bound to a variable.
///
/// Ports are metadata only. Whether the bound variable exists and has the
/// port's type is checked by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Port {
    pub name: String,
    #[serde(rename = "type")]
    pub port_type: VariableType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
}

impl Port {
    pub fn new(name: impl Into<String>, port_type: VariableType) -> Self {
        Port {
            name: name.into(),
            port_type,
            variable: None,
        }
    }

    pub fn bound(name: impl Into<String>, port_type: VariableType, variable: impl Into<String>) -> Self {
        Port {
            name: name.into(),
            port_type,
            variable: Some(variable.into()),
        }
    }

    /// Name of the bound variable; an empty binding counts as unbound.
    pub fn binding(&self) -> Option<&str> {
        self.variable.as_deref().filter(|v| !v.is_empty())
    }

    pub fn bind(&mut self, variable: impl Into<String>) {
        self.variable = Some(variable.into());
    }
}

/// Which side of a box a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}
