#![deny(missing_docs)]
//! # taskengine-critic — post-step progress evaluation (C6)
//!
//! After each step executes, [`Critic::review`] makes one call to the
//! language model asking it to judge whether execution is still
//! converging on the goal, and — in the same response — to propose a
//! corrective sequence of steps if not. Corrective steps are normalized
//! and validated the same way the Planner's own output is, by reusing
//! [`taskengine_planner::parse_plan_response`].
//!
//! [`Critic::review`] never fails: any LLM or parse error is caught and
//! degrades to [`CriticEvaluation::optimistic_fallback`] with no
//! corrective steps, per the robustness contract in the component design
//! — an unreliable critic must never destabilize otherwise healthy
//! execution.

pub mod evaluation;
pub mod prompt;

use std::sync::Arc;

use serde_json::Value;
use taskengine_llm::LlmProvider;
use taskengine_planner::parse_plan_response;
use taskengine_registry::ToolRegistry;
use taskengine_types::{CriticError, Step, StepId};
use tokio_util::sync::CancellationToken;

pub use evaluation::CriticEvaluation;
pub use prompt::build_critic_prompt;

/// Judges progress after one step and may propose corrective steps.
pub struct Critic {
    llm: Arc<dyn LlmProvider>,
    model: String,
}

impl Critic {
    /// Construct a critic bound to the given model and provider.
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }

    /// Evaluate progress after `just_executed` ran, and return any
    /// corrective steps the model proposed, already validated against
    /// `registry` and stamped with `generation`. Corrective step IDs are
    /// prefixed with `corr-g{generation}-` to mark their origin. Never
    /// raises: a degraded critic returns the optimistic fallback and an
    /// empty correction list, logging a warning.
    #[allow(clippy::too_many_arguments)]
    pub async fn review(
        &self,
        goal: &str,
        plan: &[Step],
        history: &[Step],
        just_executed: &Step,
        registry: &ToolRegistry,
        generation: u32,
        cancel: &CancellationToken,
    ) -> (CriticEvaluation, Vec<Step>) {
        match self.try_review(goal, plan, history, just_executed, registry, generation, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "taskengine.critic.degraded_to_optimistic_fallback");
                (CriticEvaluation::optimistic_fallback(), Vec::new())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn try_review(
        &self,
        goal: &str,
        plan: &[Step],
        history: &[Step],
        just_executed: &Step,
        registry: &ToolRegistry,
        generation: u32,
        cancel: &CancellationToken,
    ) -> Result<(CriticEvaluation, Vec<Step>), CriticError> {
        let prompt = build_critic_prompt(goal, plan, history, just_executed, registry);

        tracing::debug!(model = %self.model, "taskengine.critic.request");

        let response = self
            .llm
            .complete(&prompt, &self.model, cancel)
            .await
            .map_err(|e| CriticError::ModelUnreachable(e.to_string()))?;

        let stripped = taskengine_planner::strip_fences(&response);
        let value: Value = serde_json::from_str(stripped).map_err(|e| CriticError::Unparseable(e.to_string()))?;

        let corrective_raw = value.get("correctiveSteps").cloned().unwrap_or(Value::Array(Vec::new()));
        let evaluation: CriticEvaluation =
            serde_json::from_value(value).map_err(|e| CriticError::Unparseable(e.to_string()))?;

        let corrective_steps = self.validate_corrective_steps(corrective_raw, registry, generation)?;

        tracing::info!(on_track = evaluation.on_track, confidence = evaluation.confidence, corrections = corrective_steps.len(), "taskengine.critic.evaluated");

        Ok((evaluation, corrective_steps))
    }

    fn validate_corrective_steps(&self, raw: Value, registry: &ToolRegistry, generation: u32) -> Result<Vec<Step>, CriticError> {
        let items = match raw {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let json_text = serde_json::to_string(&Value::Array(items)).map_err(|e| CriticError::Unparseable(e.to_string()))?;
        let steps = parse_plan_response(&json_text, registry, generation).map_err(|e| CriticError::Unparseable(e.to_string()))?;

        Ok(steps
            .into_iter()
            .map(|mut step| {
                step.id = StepId::new(format!("corr-g{generation}-{}", step.id.as_str()));
                step
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use taskengine_llm::MockLlmProvider;
    use taskengine_registry::ToolContext;
    use taskengine_registry::ToolHandler;
    use taskengine_types::StepResult;

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

    fn registry_with_shell() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        r.register("shell", Arc::new(Noop));
        r
    }

    fn a_step() -> Step {
        Step::new(StepId::new("s1"), "do it", "shell", json!({"command": "echo hi"}))
    }

    #[tokio::test]
    async fn parses_on_track_evaluation_with_no_corrections() {
        let llm = Arc::new(MockLlmProvider::returning(
            r#"{"onTrack":true,"issues":[],"suggestions":[],"confidence":0.9,"correctiveSteps":[]}"#,
        ));
        let critic = Critic::new(llm, "critic-model");
        let registry = registry_with_shell();
        let step = a_step();

        let (eval, corrections) = critic.review("goal", &[step.clone()], &[step.clone()], &step, &registry, 1, &CancellationToken::new()).await;
        assert!(eval.on_track);
        assert!(corrections.is_empty());
    }

    #[tokio::test]
    async fn off_track_evaluation_yields_prefixed_corrective_steps() {
        let llm = Arc::new(MockLlmProvider::returning(
            r#"{"onTrack":false,"issues":["wrong path"],"suggestions":["retry"],"confidence":0.9,
                "correctiveSteps":[{"id":"fix1","description":"retry with correct path","tool":"shell","arguments":{"command":"echo fixed"}}]}"#,
        ));
        let critic = Critic::new(llm, "critic-model");
        let registry = registry_with_shell();
        let step = a_step();

        let (eval, corrections) = critic.review("goal", &[step.clone()], &[step.clone()], &step, &registry, 1, &CancellationToken::new()).await;
        assert!(!eval.on_track);
        assert!(eval.warrants_correction(0.7));
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].id.as_str(), "corr-g1-fix1");
        assert_eq!(corrections[0].generation, 1);
    }

    #[tokio::test]
    async fn unreachable_model_degrades_to_optimistic_fallback() {
        let llm = Arc::new(MockLlmProvider::unreachable("connection refused"));
        let critic = Critic::new(llm, "critic-model");
        let registry = registry_with_shell();
        let step = a_step();

        let (eval, corrections) = critic.review("goal", &[step.clone()], &[step.clone()], &step, &registry, 1, &CancellationToken::new()).await;
        assert!(eval.on_track);
        assert_eq!(eval.confidence, 0.5);
        assert!(corrections.is_empty());
    }

    #[tokio::test]
    async fn unparseable_response_degrades_to_optimistic_fallback() {
        let llm = Arc::new(MockLlmProvider::returning("not json at all"));
        let critic = Critic::new(llm, "critic-model");
        let registry = registry_with_shell();
        let step = a_step();

        let (eval, corrections) = critic.review("goal", &[step.clone()], &[step.clone()], &step, &registry, 1, &CancellationToken::new()).await;
        assert!(eval.on_track);
        assert!(corrections.is_empty());
    }

    #[tokio::test]
    async fn corrective_step_referencing_unknown_tool_degrades_the_whole_review() {
        let llm = Arc::new(MockLlmProvider::returning(
            r#"{"onTrack":false,"issues":[],"suggestions":[],"confidence":0.9,
                "correctiveSteps":[{"id":"fix1","description":"d","tool":"not_a_tool","arguments":{}}]}"#,
        ));
        let critic = Critic::new(llm, "critic-model");
        let registry = registry_with_shell();
        let step = a_step();

        let (eval, corrections) = critic.review("goal", &[step.clone()], &[step.clone()], &step, &registry, 1, &CancellationToken::new()).await;
        assert!(eval.on_track);
        assert!(corrections.is_empty());
    }
}
