//! The bounded execution context threaded into every tool invocation.

use taskengine_types::{DurationMs, SandboxId, TaskId};

/// Context a [`crate::ToolHandler`] is invoked with.
///
/// Carries just enough identity and defaults for a handler to reach the
/// sandbox bound to the owning task — never a handle to the Orchestrator
/// or the task record itself.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// The sandbox this invocation is bound to.
    pub sandbox_id: SandboxId,
    /// The owning task.
    pub task_id: TaskId,
    /// Caller identity, when the ingress supplied one. Advisory only.
    pub user_id: Option<String>,
    /// Per-operation timeout a handler should use unless its arguments
    /// override it (e.g. the `shell` tool's `timeout` field).
    pub default_timeout: DurationMs,
    /// Working directory a handler should resolve relative paths against.
    pub default_cwd: String,
}

impl ToolContext {
    /// Construct a context for one step invocation.
    pub fn new(sandbox_id: SandboxId, task_id: TaskId, default_timeout: DurationMs) -> Self {
        Self {
            sandbox_id,
            task_id,
            user_id: None,
            default_timeout,
            default_cwd: "/work".to_string(),
        }
    }

    /// Attach a caller identity, builder-style.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}
