//! Typed pipeline variables.
//!
//! A variable's value is either a literal or a reference to a variable of an
//! external table (test and environment configuration), written `$name`. A
//! literal that has to start with the sigil is escaped as `\$name`.

use std::collections::BTreeMap;
use std::fmt;

use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

pub const REFERENCE_SIGIL: char = '$';
pub const ESCAPED_SIGIL: &str = "\\$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum VariableType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "string[]")]
    StringArray,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "file[]")]
    FileArray,
}

impl VariableType {
    pub fn is_array(self) -> bool {
        matches!(self, VariableType::StringArray | VariableType::FileArray)
    }

    pub fn is_file(self) -> bool {
        matches!(self, VariableType::File | VariableType::FileArray)
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableType::String => "string",
            VariableType::StringArray => "string[]",
            VariableType::File => "file",
            VariableType::FileArray => "file[]",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum VariableValue {
    Single(String),
    Array(Vec<String>),
}

impl VariableValue {
    /// The empty value of a type: `""` or `[]`.
    pub fn empty(var_type: VariableType) -> Self {
        if var_type.is_array() {
            VariableValue::Array(Vec::new())
        } else {
            VariableValue::Single(String::new())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            VariableValue::Single(s) => s.is_empty(),
            VariableValue::Array(items) => items.is_empty(),
        }
    }

    /// The value as a list: a single value becomes one item, an empty
    /// single value none.
    pub fn items(&self) -> Vec<String> {
        match self {
            VariableValue::Single(s) if s.is_empty() => Vec::new(),
            VariableValue::Single(s) => vec![s.clone()],
            VariableValue::Array(items) => items.clone(),
        }
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            VariableValue::Single(s) => Some(s),
            VariableValue::Array(_) => None,
        }
    }

    fn fits(&self, var_type: VariableType) -> bool {
        match self {
            VariableValue::Single(s) => !var_type.is_array() || is_reference(s) || s.is_empty(),
            VariableValue::Array(_) => var_type.is_array(),
        }
    }
}

fn is_reference(value: &str) -> bool {
    value.starts_with(REFERENCE_SIGIL)
}

fn unescape(value: &str) -> String {
    match value.strip_prefix(ESCAPED_SIGIL) {
        Some(rest) => format!("{REFERENCE_SIGIL}{rest}"),
        None => value.to_string(),
    }
}

/// A file of the submission, identified by name and optionally content hash.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubmittedFile {
    pub name: String,
    #[serde(default)]
    pub hash: Option<String>,
}

impl SubmittedFile {
    pub fn new(name: impl Into<String>) -> Self {
        SubmittedFile {
            name: name.into(),
            hash: None,
        }
    }

    /// Whether the file name matches a compiled [`file_pattern`].
    pub fn matches(&self, pattern: &GlobMatcher) -> bool {
        pattern.is_match(&self.name)
    }
}

/// Compiles a glob such as `*.c`, `main?.c` or `*.[ch]` for matching
/// submitted file names.
pub fn file_pattern(pattern: &str) -> Result<GlobMatcher, PipelineError> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| PipelineError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.kind().to_string(),
        })
}

#[derive(Deserialize)]
struct RawVariable {
    name: String,
    #[serde(rename = "type")]
    var_type: VariableType,
    #[serde(default)]
    value: Option<VariableValue>,
    #[serde(default)]
    remote: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVariable")]
pub struct Variable {
    name: String,
    #[serde(rename = "type")]
    var_type: VariableType,
    value: VariableValue,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    remote: bool,
}

impl TryFrom<RawVariable> for Variable {
    type Error = PipelineError;

    fn try_from(raw: RawVariable) -> Result<Self, Self::Error> {
        let value = raw
            .value
            .unwrap_or_else(|| VariableValue::empty(raw.var_type));
        let mut variable = Variable::new(raw.name, raw.var_type, value)?;
        variable.remote = raw.remote;
        Ok(variable)
    }
}

impl Variable {
    pub fn new(
        name: impl Into<String>,
        var_type: VariableType,
        value: VariableValue,
    ) -> Result<Self, PipelineError> {
        let name = name.into();
        if !value.fits(var_type) {
            return Err(PipelineError::InvalidValue {
                variable: name,
                var_type,
            });
        }
        Ok(Variable {
            name,
            var_type,
            value,
            remote: false,
        })
    }

    /// A variable with the empty value of its type.
    pub fn empty(name: impl Into<String>, var_type: VariableType) -> Self {
        Variable {
            name: name.into(),
            var_type,
            value: VariableValue::empty(var_type),
            remote: false,
        }
    }

    /// Marks the variable as naming supplementary (remote) files.
    pub fn into_remote(mut self) -> Self {
        self.remote = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn var_type(&self) -> VariableType {
        self.var_type
    }

    pub fn value(&self) -> &VariableValue {
        &self.value
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// Name of the referenced variable, if the value is `$name`.
    pub fn reference(&self) -> Option<&str> {
        match &self.value {
            VariableValue::Single(s) if is_reference(s) => Some(&s[REFERENCE_SIGIL.len_utf8()..]),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.reference().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Whether the variable carries a value of its own, so that it needs no
    /// writer in the pipeline.
    pub fn has_default(&self) -> bool {
        !self.value.is_empty()
    }

    /// The value with escapes removed. References are returned unresolved.
    pub fn literal(&self) -> VariableValue {
        match &self.value {
            VariableValue::Single(s) => VariableValue::Single(unescape(s)),
            VariableValue::Array(items) => {
                VariableValue::Array(items.iter().map(|s| unescape(s)).collect())
            }
        }
    }

    /// Replaces the value, keeping the declared type.
    pub fn set_value(&mut self, value: VariableValue) -> Result<(), PipelineError> {
        if !value.fits(self.var_type) {
            return Err(PipelineError::InvalidValue {
                variable: self.name.clone(),
                var_type: self.var_type,
            });
        }
        self.value = value;
        Ok(())
    }
}

/// Named variables with unique names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Variable>", into = "Vec<Variable>")]
pub struct VariableTable {
    variables: BTreeMap<String, Variable>,
}

impl TryFrom<Vec<Variable>> for VariableTable {
    type Error = PipelineError;

    fn try_from(variables: Vec<Variable>) -> Result<Self, Self::Error> {
        VariableTable::from_variables(variables)
    }
}

impl From<VariableTable> for Vec<Variable> {
    fn from(table: VariableTable) -> Self {
        table.variables.into_values().collect()
    }
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_variables<I>(variables: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = Variable>,
    {
        let mut table = VariableTable::new();
        for variable in variables {
            table.add(variable)?;
        }
        Ok(table)
    }

    /// Adds a new variable; fails on a duplicate name.
    pub fn add(&mut self, variable: Variable) -> Result<(), PipelineError> {
        if self.variables.contains_key(variable.name()) {
            return Err(PipelineError::DuplicateVariable(variable.name().to_string()));
        }
        self.variables.insert(variable.name().to_string(), variable);
        Ok(())
    }

    /// Adds or replaces a variable.
    pub fn set(&mut self, variable: Variable) {
        self.variables.insert(variable.name().to_string(), variable);
    }

    /// Layers `overrides` on top of `self`, later definitions winning.
    pub fn overlay(&self, overrides: &VariableTable) -> VariableTable {
        let mut merged = self.clone();
        for variable in overrides.iter() {
            merged.set(variable.clone());
        }
        merged
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Resolves `variable` against `table`, one hop deep.
///
/// A literal is returned unescaped. A reference must name a variable of the
/// same type whose own value is a literal; a chain of references is reported
/// as unresolved.
pub fn resolve_reference(
    variable: &Variable,
    table: &VariableTable,
) -> Result<VariableValue, PipelineError> {
    let Some(reference) = variable.reference() else {
        return Ok(variable.literal());
    };

    let unresolved = || PipelineError::UnresolvedReference {
        variable: variable.name().to_string(),
        reference: reference.to_string(),
    };

    let target = table.get(reference).ok_or_else(unresolved)?;
    if target.is_reference() {
        return Err(unresolved());
    }
    if target.var_type() != variable.var_type() {
        return Err(PipelineError::TypeMismatch {
            variable: target.name().to_string(),
            expected: variable.var_type(),
            actual: target.var_type(),
        });
    }
    Ok(target.literal())
}

/// Binds a submitted file to a file variable: a `file` is replaced, a
/// `file[]` gains one more item.
pub fn bind_file(variable: &mut Variable, file: &SubmittedFile) -> Result<(), PipelineError> {
    match variable.var_type() {
        VariableType::File => variable.set_value(VariableValue::Single(file.name.clone())),
        VariableType::FileArray => {
            let mut items = match variable.value() {
                VariableValue::Array(items) => items.clone(),
                // An unresolved reference is superseded by the submission.
                VariableValue::Single(_) => Vec::new(),
            };
            if !items.contains(&file.name) {
                items.push(file.name.clone());
            }
            variable.set_value(VariableValue::Array(items))
        }
        actual => Err(PipelineError::TypeMismatch {
            variable: variable.name().to_string(),
            expected: if actual.is_array() {
                VariableType::FileArray
            } else {
                VariableType::File
            },
            actual,
        }),
    }
}
