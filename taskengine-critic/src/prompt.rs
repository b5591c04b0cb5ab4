//! Prompt construction for the Critic's single post-step model call.

use taskengine_registry::ToolRegistry;
use taskengine_types::Step;

/// Build the prompt sent to the language model after one step executes.
///
/// Combines the goal, the full current plan, the subset of the plan that
/// has already run (execution history), the just-executed step, and the
/// registry's tool descriptions (so any corrective steps the model
/// proposes reference real tools). Demands a single JSON object response
/// carrying both the evaluation fields and an optional `correctiveSteps`
/// array, shaped like the Planner's step objects.
pub fn build_critic_prompt(goal: &str, plan: &[Step], history: &[Step], just_executed: &Step, registry: &ToolRegistry) -> String {
    let tools = registry
        .describe()
        .into_iter()
        .map(|def| format!("- {} : {}\n  input_schema: {}", def.name, def.description, def.input_schema))
        .collect::<Vec<_>>()
        .join("\n");

    let plan_summary = summarize_steps(plan);
    let history_summary = summarize_steps(history);
    let just_executed_summary = serde_json::to_string(just_executed).unwrap_or_default();

    format!(
        "You are critiquing the progress of an autonomous task-execution agent. \
         Judge whether execution is still converging on the goal after the most \
         recent step.\n\n\
         Goal: {goal}\n\n\
         Full current plan:\n{plan_summary}\n\n\
         Steps already executed:\n{history_summary}\n\n\
         Just executed:\n{just_executed_summary}\n\n\
         Available tools (for any corrective steps you propose):\n{tools}\n\n\
         Respond with a JSON object ONLY, no prose, no Markdown fences, with fields: \
         onTrack (boolean), issues (array of strings), suggestions (array of strings), \
         confidence (number 0..1), correctiveSteps (array, may be empty — each element \
         shaped like a plan step: id, description, tool, arguments, success_criterion \
         optional, required optional).\n"
    )
}

fn summarize_steps(steps: &[Step]) -> String {
    if steps.is_empty() {
        return "(none)".to_string();
    }
    steps
        .iter()
        .map(|s| format!("- [{:?}] {} ({}): {}", s.status, s.id, s.tool, s.description))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use taskengine_registry::{ToolContext, ToolHandler};
    use taskengine_types::{StepId, StepResult};

    struct Noop;

    #[async_trait]
    impl ToolHandler for Noop {
        fn description(&self) -> &str {
            "noop"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn invoke(&self, _arguments: Value, _ctx: &ToolContext) -> StepResult {
            StepResult::success("")
        }
    }

    #[test]
    fn prompt_includes_goal_and_just_executed_step() {
        let mut registry = ToolRegistry::new();
        registry.register("shell", Arc::new(Noop));
        let step = Step::new(StepId::new("s1"), "run it", "shell", json!({"command": "echo hi"}));
        let prompt = build_critic_prompt("do the thing", &[step.clone()], &[step.clone()], &step, &registry);
        assert!(prompt.contains("do the thing"));
        assert!(prompt.contains("correctiveSteps"));
        assert!(prompt.contains("shell"));
    }

    #[test]
    fn empty_plan_and_history_render_none() {
        let registry = ToolRegistry::new();
        let step = Step::new(StepId::new("s1"), "d", "shell", json!({}));
        let prompt = build_critic_prompt("goal", &[], &[], &step, &registry);
        assert!(prompt.contains("(none)"));
    }
}
