#![deny(missing_docs)]
//! # taskengine-planner — plan generation from a goal (C4)
//!
//! Produces an ordered, validated list of [`taskengine_types::Step`]s from
//! a goal and the registry's advertised tool schemas, via a single call to
//! a [`taskengine_llm::LlmProvider`]. [`parse::parse_plan_response`] is
//! exposed for reuse by the Critic, which must normalize and validate its
//! corrective steps the same way.

pub mod parse;
pub mod prompt;

use std::sync::Arc;

use taskengine_llm::LlmProvider;
use taskengine_registry::ToolRegistry;
use taskengine_types::{PlannerError, Step};
use tokio_util::sync::CancellationToken;

pub use parse::{parse_plan_response, strip_fences};
pub use prompt::build_prompt;

/// Generates plans by combining a fixed instruction prompt, the registry's
/// tool descriptions, and a goal into a single model call.
pub struct Planner {
    llm: Arc<dyn LlmProvider>,
    model: String,
}

impl Planner {
    /// Construct a planner bound to the given model and provider.
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }

    /// Produce a plan for `goal` given `context` and the tools currently
    /// registered in `registry`. Every returned step has `generation = 0`.
    pub async fn plan(
        &self,
        goal: &str,
        context: &serde_json::Value,
        registry: &ToolRegistry,
        cancel: &CancellationToken,
    ) -> Result<Vec<Step>, PlannerError> {
        let prompt = build_prompt(goal, context, registry);

        tracing::debug!(model = %self.model, "taskengine.planner.request");

        let response = self
            .llm
            .complete(&prompt, &self.model, cancel)
            .await
            .map_err(|e| PlannerError::ModelUnreachable(e.to_string()))?;

        let plan = parse_plan_response(&response, registry, 0)?;
        tracing::info!(steps = plan.len(), "taskengine.planner.plan_generated");
        Ok(plan)
    }
}
