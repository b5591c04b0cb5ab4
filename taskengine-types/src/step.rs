//! A single tool invocation within a task's plan.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::Artifact;
use crate::id::StepId;

/// Status of a step within the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not yet dispatched to the Executor.
    Pending,
    /// The Executor has dispatched the tool call and is awaiting its result.
    Running,
    /// The tool call returned `success: true`.
    Completed,
    /// The tool call returned `success: false`, or the tool was unknown.
    Failed,
}

/// The outcome of executing a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Whether the tool reported success.
    pub success: bool,
    /// Human-readable output text (already truncated by the adapter, if applicable).
    pub output: String,
    /// Structured metadata the adapter chose to surface (exit code, stderr, etc).
    #[serde(default)]
    pub metadata: Value,
    /// Error text, set when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Artifacts produced by this step. Only ever populated on success.
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl StepResult {
    /// Build a successful result.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            metadata: Value::Null,
            error: None,
            artifacts: Vec::new(),
        }
    }

    /// Build a failed result.
    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            output: String::new(),
            metadata: Value::Null,
            error: Some(error),
            artifacts: Vec::new(),
        }
    }

    /// Attach metadata, builder-style.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach artifacts, builder-style.
    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.artifacts = artifacts;
        self
    }
}

/// One tool invocation, planned by the Planner or Critic and carried out by the Executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique within the owning task, including after correction splicing.
    pub id: StepId,
    /// Human-readable description of what this step is meant to accomplish.
    pub description: String,
    /// Name of the tool to invoke; must resolve in the registry at execution time.
    pub tool: String,
    /// Arguments passed to the tool; must conform to the tool's JSON schema.
    pub arguments: Value,
    /// Free-form, advisory criterion for the Critic to judge against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_criterion: Option<String>,
    /// If false, a failure of this step does not abort the plan.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Current lifecycle status.
    pub status: StepStatus,
    /// Set once the Executor has run this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
    /// Number of correction generations between this step and the original
    /// plan: 0 for planner-authored steps, N+1 for a corrective step spliced
    /// in response to generation-N step's critique.
    #[serde(default)]
    pub generation: u32,
}

fn default_required() -> bool {
    true
}

impl Step {
    /// Construct a pending, planner-authored step (generation 0, required by default).
    pub fn new(id: StepId, description: impl Into<String>, tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            id,
            description: description.into(),
            tool: tool.into(),
            arguments,
            success_criterion: None,
            required: true,
            status: StepStatus::Pending,
            result: None,
            generation: 0,
        }
    }
}
