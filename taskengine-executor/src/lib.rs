#![deny(missing_docs)]
//! # taskengine-executor — runs one plan step (C5)
//!
//! `execute_step` never raises: an unknown tool or a handler failure is
//! recorded on the returned step, never propagated. The Executor is the
//! Orchestrator's only source of step results, and the Orchestrator trusts
//! that contract absolutely — it never wraps a call to this crate in its
//! own error handling.

use taskengine_registry::{ToolContext, ToolRegistry};
use taskengine_types::{Step, StepStatus};

/// Run one step to completion: look up its tool in `registry`, invoke it
/// with `ctx`, and fold the result back into the step. Returns the step
/// with `status` set to `completed` or `failed` and `result` populated.
pub async fn execute_step(mut step: Step, registry: &ToolRegistry, ctx: &ToolContext) -> Step {
    step.status = StepStatus::Running;

    let Some(tool) = registry.get(&step.tool) else {
        tracing::warn!(step = %step.id, tool = %step.tool, "taskengine.executor.tool_not_found");
        step.status = StepStatus::Failed;
        step.result = Some(taskengine_types::StepResult::failure(format!("tool not found: {}", step.tool)));
        return step;
    };

    tracing::debug!(step = %step.id, tool = %step.tool, "taskengine.executor.invoke");
    let result = tool.invoke(step.arguments.clone(), ctx).await;

    step.status = if result.success { StepStatus::Completed } else { StepStatus::Failed };
    step.result = Some(result);
    step
}
