//! # Compiler
//!
//! Turns a validated pipeline into worker tasks in two phases:
//!
//! 1. **Plan**: resolve every variable against the external table (test and
//!    environment variables), then let each box, in dependency order, fill in
//!    the outputs it derives (artifact names, file lists).
//! 2. **Emit**: walk the same order again and ask each box for its tasks.
//!    Nothing is mutated in this phase, so compiling an unchanged pipeline
//!    twice yields the same tasks.
//!
//! Sandboxed boxes get their limits from the exercise's limit table.
//! Execution boxes must have an entry for the hardware group; other
//! sandboxed boxes run unbounded when they have none.

use std::collections::BTreeSet;

use util::languages::Language;
use util::limits::{ExerciseLimits, Limits, LimitsError};
use util::paths::WorkingDirs;

use crate::boxes::registry::BoxRegistry;
use crate::boxes::{Binding, BoxEnv, BoxType, PlanScope, ResolvedValues};
use crate::error::PipelineError;
use crate::graph::DependencyGraph;
use crate::pipeline::Pipeline;
use crate::task::{BoxCategory, Task};
use crate::validator::check_remote_value;
use crate::variable::{SubmittedFile, VariableTable, resolve_reference};

/// Everything a compilation depends on besides the pipeline itself.
pub struct CompileContext<'a> {
    pub registry: &'a BoxRegistry,
    pub hardware_group: &'a str,
    /// Toolchain of the selected environment, for generic boxes.
    pub language: Option<Language>,
    pub submitted_files: &'a [SubmittedFile],
    /// Variables references resolve against.
    pub external: &'a VariableTable,
    pub limits: &'a ExerciseLimits,
    pub dirs: &'a WorkingDirs,
    pub supplementary_files: &'a BTreeSet<String>,
    /// Prefix of task ids and limit keys; `None` outside of a test.
    pub test_id: Option<&'a str>,
}

impl CompileContext<'_> {
    /// `<test>.<box>`, or the bare box name outside of a test.
    pub fn qualified(&self, box_name: &str) -> String {
        match self.test_id {
            Some(test) => format!("{test}.{box_name}"),
            None => box_name.to_string(),
        }
    }
}

/// Result of the planning phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Box indices in emission order.
    pub order: Vec<usize>,
    pub values: ResolvedValues,
}

pub fn plan(pipeline: &Pipeline, ctx: &CompileContext<'_>) -> Result<Plan, PipelineError> {
    let order = DependencyGraph::build(pipeline).topological_order()?;

    let mut values = ResolvedValues::new();
    for variable in pipeline.variables.iter() {
        let value = resolve_reference(variable, ctx.external)?;
        if variable.is_remote() {
            check_remote_value(variable.name(), &value, ctx.supplementary_files)?;
        }
        values.insert(
            variable.name().to_string(),
            Binding {
                var_type: variable.var_type(),
                value,
                remote: variable.is_remote(),
            },
        );
    }

    for &index in &order {
        let instance = &pipeline.boxes[index];
        let box_type = ctx.registry.type_of(instance)?;
        let mut scope = PlanScope::new(instance, &mut values, ctx.language, ctx.submitted_files);
        box_type.plan(&mut scope)?;
    }
    Ok(Plan { order, values })
}

/// Limits for one box, or `None` when the box runs unbounded.
fn box_limits(
    box_type: &dyn BoxType,
    box_id: &str,
    ctx: &CompileContext<'_>,
) -> Result<Option<Limits>, PipelineError> {
    if !box_type.is_sandboxed() {
        return Ok(None);
    }
    match ctx.limits.resolve(ctx.hardware_group, box_id) {
        Ok(limits) => Ok(Some(limits)),
        Err(LimitsError::MissingLimits { .. } | LimitsError::UnknownHardwareGroup(_))
            if box_type.category() != BoxCategory::Execution =>
        {
            Ok(None)
        }
        Err(LimitsError::UnknownHardwareGroup(_)) => Err(LimitsError::MissingLimits {
            box_id: box_id.to_string(),
            hardware_group: ctx.hardware_group.to_string(),
        }
        .into()),
        Err(err) => Err(err.into()),
    }
}

/// Compiles one pipeline. Priorities start at 1 and follow emission order.
pub fn compile_pipeline(
    pipeline: &Pipeline,
    ctx: &CompileContext<'_>,
) -> Result<Vec<Task>, PipelineError> {
    let plan = plan(pipeline, ctx)?;

    let mut tasks = Vec::new();
    for &index in &plan.order {
        let instance = &pipeline.boxes[index];
        let box_type = ctx.registry.type_of(instance)?;
        let box_id = ctx.qualified(&instance.name);
        let limits = box_limits(box_type, &box_id, ctx)?;

        let env = BoxEnv {
            instance,
            values: &plan.values,
            dirs: ctx.dirs,
            language: ctx.language,
            hardware_group: ctx.hardware_group,
            limits: limits.as_ref(),
        };
        let drafts = box_type.compile(&env)?;
        tracing::debug!(box_id = %box_id, tasks = drafts.len(), "compiled box");

        let several = drafts.len() > 1;
        for (n, draft) in drafts.into_iter().enumerate() {
            let id = if several {
                format!("{box_id}.{}", n + 1)
            } else {
                box_id.clone()
            };
            tasks.push(Task {
                id,
                priority: tasks.len() as u32 + 1,
                command_binary: draft.command_binary,
                arguments: draft.arguments,
                task_type: box_type.category(),
                test_id: ctx.test_id.map(str::to_string),
                sandbox: draft.sandbox,
            });
        }
    }
    Ok(tasks)
}
