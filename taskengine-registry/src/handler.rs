//! The uniform tool handler contract (C1/C3 boundary).

use async_trait::async_trait;
use serde_json::Value;
use taskengine_types::StepResult;

use crate::context::ToolContext;

/// A tool's advertised shape, as surfaced to the Planner's prompt via
/// [`crate::ToolRegistry::describe`].
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON-schema description of the tool's input object.
    pub input_schema: Value,
}

/// A named handler with a JSON-schema input contract and a uniform
/// invocation signature.
///
/// Implementations are stored as type-erased `Arc<dyn ToolHandler>` in the
/// registry; there is deliberately no strongly-typed per-tool variant —
/// see the registry's module docs for the rationale.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Human-readable description of what this tool does.
    fn description(&self) -> &str;

    /// JSON-schema description of the tool's input object.
    fn input_schema(&self) -> Value;

    /// Invoke the tool. Never raises: failures (policy rejection, sandbox
    /// error, timeout) are reported as `StepResult { success: false, .. }`.
    async fn invoke(&self, arguments: Value, ctx: &ToolContext) -> StepResult;
}
