//! `shell`: runs a command inside the sandbox via its shell service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use taskengine_types::{DurationMs, StepResult};

use taskengine_registry::{ToolContext, ToolHandler};
use taskengine_sandbox::{SandboxManager, ShellOptions};

use crate::{truncate_with_marker, SHELL_OUTPUT_LIMIT};

/// `{command (required), timeout? (ms), cwd? (path)}` → runs `command` in
/// the sandbox's shell service. `result.output` is stdout (truncated to
/// 10 000 characters); exit code and stderr are carried in `metadata`.
/// Blocklist enforcement lives in the Sandbox Manager, not here.
pub struct ShellTool {
    sandbox: Arc<dyn SandboxManager>,
}

impl ShellTool {
    /// Construct a shell adapter atop the given sandbox manager.
    pub fn new(sandbox: Arc<dyn SandboxManager>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl ToolHandler for ShellTool {
    fn description(&self) -> &str {
        "Runs a shell command inside the task's sandbox and returns its stdout."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {"type": "string"},
                "timeout": {"type": "integer", "description": "milliseconds"},
                "cwd": {"type": "string"}
            },
            "required": ["command"]
        })
    }

    async fn invoke(&self, arguments: Value, ctx: &ToolContext) -> StepResult {
        let Some(command) = arguments.get("command").and_then(Value::as_str) else {
            return StepResult::failure("shell: missing required field 'command'");
        };

        let timeout = arguments
            .get("timeout")
            .and_then(Value::as_u64)
            .map(DurationMs::from_millis)
            .unwrap_or(ctx.default_timeout);
        let cwd = arguments.get("cwd").and_then(Value::as_str).map(str::to_string);

        tracing::debug!(sandbox = %ctx.sandbox_id, command = %command, "taskengine.tools.shell.invoke");

        let result = match self
            .sandbox
            .execute_shell(&ctx.sandbox_id, command, ShellOptions { timeout, cwd })
            .await
        {
            Ok(result) => result,
            Err(e) => return StepResult::failure(format!("shell: sandbox call failed: {e}")),
        };

        let stdout = truncate_with_marker(&result.stdout, SHELL_OUTPUT_LIMIT);
        let stderr = truncate_with_marker(&result.stderr, SHELL_OUTPUT_LIMIT);
        let metadata = json!({"exit_code": result.exit_code, "stderr": stderr});

        if result.success {
            StepResult::success(stdout).with_metadata(metadata)
        } else {
            let error = result.error.unwrap_or_else(|| "shell command failed".to_string());
            StepResult::failure(error).with_metadata(metadata)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskengine_sandbox_ref::ReferenceSandboxManager;
    use taskengine_types::{SandboxId, TaskId};
    use tokio_util::sync::CancellationToken;

    async fn sandbox_with_ctx() -> (Arc<dyn SandboxManager>, ToolContext) {
        let mgr: Arc<dyn SandboxManager> = Arc::new(ReferenceSandboxManager::new());
        let id = SandboxId::new("sbx-shell-test");
        mgr.create(&id, &Default::default(), &CancellationToken::new()).await.unwrap();
        let ctx = ToolContext::new(id.clone(), TaskId::new("t"), DurationMs::from_secs(5));
        (mgr, ctx)
    }

    #[tokio::test]
    async fn runs_an_ordinary_command() {
        let (mgr, ctx) = sandbox_with_ctx().await;
        let tool = ShellTool::new(mgr);
        let result = tool.invoke(json!({"command": "echo hi"}), &ctx).await;
        assert!(result.success);
        assert_eq!(result.output.trim(), "hi");
    }

    #[tokio::test]
    async fn blocked_command_fails_without_success() {
        let (mgr, ctx) = sandbox_with_ctx().await;
        let tool = ShellTool::new(mgr);
        let result = tool.invoke(json!({"command": "sudo rm -rf /"}), &ctx).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("policy"));
    }

    #[tokio::test]
    async fn missing_command_fails_without_calling_sandbox() {
        let (mgr, ctx) = sandbox_with_ctx().await;
        let tool = ShellTool::new(mgr);
        let result = tool.invoke(json!({}), &ctx).await;
        assert!(!result.success);
    }
}
