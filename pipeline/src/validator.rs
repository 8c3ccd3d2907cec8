//! Pipeline validation.
//!
//! [`validate`] only reads the pipeline, so running it twice gives the same
//! verdict. It checks, in order:
//! - every box has a known type, a unique name and ports its type declares;
//! - every bound variable exists and has the type of its port;
//! - every variable has exactly one writer, or none and a default value;
//! - every variable is read by some input port;
//! - the boxes do not depend on each other in a cycle.

use std::collections::{BTreeSet, HashSet};

use crate::boxes::registry::BoxRegistry;
use crate::error::PipelineError;
use crate::graph::DependencyGraph;
use crate::pipeline::Pipeline;
use crate::variable::VariableValue;

pub fn validate(pipeline: &Pipeline, registry: &BoxRegistry) -> Result<(), PipelineError> {
    validate_boxes(pipeline, registry)?;
    validate_variables(pipeline)?;
    DependencyGraph::build(pipeline).topological_order()?;
    Ok(())
}

fn validate_boxes(pipeline: &Pipeline, registry: &BoxRegistry) -> Result<(), PipelineError> {
    let mut names = HashSet::new();
    for instance in &pipeline.boxes {
        let box_type = registry.type_of(instance)?;
        if !names.insert(instance.name.as_str()) {
            return Err(PipelineError::DuplicateBox(instance.name.clone()));
        }
        box_type.validate(instance)?;

        for (_, port) in instance.ports() {
            let Some(name) = port.binding() else {
                continue;
            };
            let variable =
                pipeline
                    .variables
                    .get(name)
                    .ok_or_else(|| PipelineError::UnknownVariable {
                        box_name: instance.name.clone(),
                        port: port.name.clone(),
                        variable: name.to_string(),
                    })?;
            if variable.var_type() != port.port_type {
                return Err(PipelineError::PortTypeMismatch {
                    box_name: instance.name.clone(),
                    port: port.name.clone(),
                    port_type: port.port_type,
                    variable: name.to_string(),
                    variable_type: variable.var_type(),
                });
            }
        }
    }
    Ok(())
}

fn validate_variables(pipeline: &Pipeline) -> Result<(), PipelineError> {
    let writers = pipeline.writers();
    let readers = pipeline.readers();

    for variable in pipeline.variables.iter() {
        let name = variable.name();
        match writers.get(name).map(Vec::len).unwrap_or(0) {
            0 if !variable.has_default() => {
                return Err(PipelineError::NoWriter(name.to_string()));
            }
            0 | 1 => {}
            _ => {
                return Err(PipelineError::MultipleWriters {
                    variable: name.to_string(),
                    writers: writers[name].iter().map(ToString::to_string).collect(),
                });
            }
        }
        if !readers.contains_key(name) {
            return Err(PipelineError::UnusedVariable(name.to_string()));
        }
    }
    Ok(())
}

/// Checks that every remote variable with a literal value names files of
/// the exercise's supplementary-file set. References are checked once they
/// are resolved, at compile time.
pub fn validate_remote_files(
    pipeline: &Pipeline,
    supplementary_files: &BTreeSet<String>,
) -> Result<(), PipelineError> {
    for variable in pipeline.variables.iter().filter(|v| v.is_remote()) {
        if variable.is_reference() {
            continue;
        }
        check_remote_value(variable.name(), &variable.literal(), supplementary_files)?;
    }
    Ok(())
}

pub(crate) fn check_remote_value(
    variable: &str,
    value: &VariableValue,
    supplementary_files: &BTreeSet<String>,
) -> Result<(), PipelineError> {
    match value
        .items()
        .into_iter()
        .find(|f| !supplementary_files.contains(f))
    {
        Some(file) => Err(PipelineError::MissingRemoteFile {
            variable: variable.to_string(),
            file,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::PipelineBox;
    use crate::port::Port;
    use crate::variable::{Variable, VariableType};

    fn registry() -> BoxRegistry {
        BoxRegistry::standard()
    }

    fn file(name: &str, value: &str) -> Variable {
        Variable::new(name, VariableType::File, VariableValue::Single(value.into())).unwrap()
    }

    /// file-in -> c-execution -> judge
    fn valid_pipeline() -> Pipeline {
        let r = registry();
        Pipeline::new()
            .with_box(
                r.instantiate("file-in", Some("input"))
                    .unwrap()
                    .bind_input("input", "test-in")
                    .bind_output("output", "in"),
            )
            .with_box(
                r.instantiate("c-execution", Some("run"))
                    .unwrap()
                    .bind_input("binary-file", "binary")
                    .bind_input("stdin", "in")
                    .bind_output("stdout", "out"),
            )
            .with_box(
                r.instantiate("judge", None)
                    .unwrap()
                    .bind_input("actual-output", "out")
                    .bind_input("expected-output", "expected"),
            )
            .with_variable(file("test-in", "01.in").into_remote())
            .and_then(|p| p.with_variable(Variable::empty("in", VariableType::File)))
            .and_then(|p| p.with_variable(file("binary", "a.out")))
            .and_then(|p| p.with_variable(Variable::empty("out", VariableType::File)))
            .and_then(|p| p.with_variable(file("expected", "01.out")))
            .unwrap()
    }

    #[test]
    fn test_valid_pipeline_is_idempotent() {
        let pipeline = valid_pipeline();
        let before = pipeline.clone();
        assert!(validate(&pipeline, &registry()).is_ok());
        assert!(validate(&pipeline, &registry()).is_ok());
        assert_eq!(pipeline, before);
    }

    #[test]
    fn test_unknown_variable() {
        let mut pipeline = valid_pipeline();
        pipeline.boxes[2].ports_in[1].bind("nope");
        let err = validate(&pipeline, &registry()).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownVariable { ref variable, .. } if variable == "nope"));
    }

    #[test]
    fn test_port_type_mismatch_names_both_types() {
        let pipeline = valid_pipeline()
            .with_variable(Variable::new(
                "mode",
                VariableType::StringArray,
                VariableValue::Array(vec!["token".into()]),
            )
            .unwrap())
            .unwrap();
        let mut pipeline = pipeline;
        pipeline.boxes[2].ports_in[0].bind("mode");
        let err = validate(&pipeline, &registry()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("string[]"), "{message}");
        assert!(message.contains("of type string,"), "{message}");
    }

    #[test]
    fn test_multiple_writers() {
        let mut pipeline = valid_pipeline();
        let second = registry()
            .instantiate("file-in", Some("input2"))
            .unwrap()
            .bind_input("input", "test-in")
            .bind_output("output", "in");
        pipeline.boxes.push(second);
        let err = validate(&pipeline, &registry()).unwrap_err();
        match err {
            PipelineError::MultipleWriters { variable, writers } => {
                assert_eq!(variable, "in");
                assert_eq!(writers, vec!["input.output", "input2.output"]);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_no_writer_without_default() {
        let mut pipeline = valid_pipeline();
        pipeline.boxes[1].ports_out.clear();
        assert!(matches!(
            validate(&pipeline, &registry()),
            Err(PipelineError::NoWriter(ref v)) if v == "out"
        ));
    }

    #[test]
    fn test_unused_variable() {
        let pipeline = valid_pipeline()
            .with_variable(file("spare", "x.txt"))
            .unwrap();
        assert!(matches!(
            validate(&pipeline, &registry()),
            Err(PipelineError::UnusedVariable(ref v)) if v == "spare"
        ));
    }

    #[test]
    fn test_duplicate_box_and_unknown_port() {
        let mut pipeline = valid_pipeline();
        pipeline.boxes[1].name = "input".into();
        assert!(matches!(
            validate(&pipeline, &registry()),
            Err(PipelineError::DuplicateBox(_))
        ));

        let mut pipeline = valid_pipeline();
        pipeline.boxes[2]
            .ports_in
            .push(Port::new("tolerance", VariableType::String));
        assert!(matches!(
            validate(&pipeline, &registry()),
            Err(PipelineError::UnknownPort { ref port, .. }) if port == "tolerance"
        ));
    }

    #[test]
    fn test_unknown_box_type() {
        let pipeline = Pipeline::new().with_box(PipelineBox {
            name: "x".into(),
            box_type: "fortran-compilation".into(),
            ports_in: vec![],
            ports_out: vec![],
        });
        assert!(matches!(
            validate(&pipeline, &registry()),
            Err(PipelineError::UnknownBoxType { .. })
        ));
    }

    #[test]
    fn test_remote_files_present() {
        let pipeline = valid_pipeline();
        let mut files: BTreeSet<String> = BTreeSet::new();
        assert!(matches!(
            validate_remote_files(&pipeline, &files),
            Err(PipelineError::MissingRemoteFile { ref file, .. }) if file == "01.in"
        ));
        files.insert("01.in".into());
        assert!(validate_remote_files(&pipeline, &files).is_ok());
    }
}
