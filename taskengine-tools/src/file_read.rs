//! `file_read`: reads a file from the sandbox's `/work` filesystem.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use taskengine_types::StepResult;

use taskengine_registry::{ToolContext, ToolHandler};
use taskengine_sandbox::SandboxManager;

/// `{path}` → the file's content as `result.output`. The 5 MiB read
/// ceiling and the path denylist are enforced at the sandbox/service
/// layer, not here.
pub struct FileReadTool {
    sandbox: Arc<dyn SandboxManager>,
}

impl FileReadTool {
    /// Construct a file-read adapter atop the given sandbox manager.
    pub fn new(sandbox: Arc<dyn SandboxManager>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl ToolHandler for FileReadTool {
    fn description(&self) -> &str {
        "Reads a file from the task's sandbox and returns its content."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"path": {"type": "string"}},
            "required": ["path"]
        })
    }

    async fn invoke(&self, arguments: Value, ctx: &ToolContext) -> StepResult {
        let Some(path) = arguments.get("path").and_then(Value::as_str) else {
            return StepResult::failure("file_read: missing required field 'path'");
        };

        tracing::debug!(sandbox = %ctx.sandbox_id, path = %path, "taskengine.tools.file_read.invoke");

        match self.sandbox.read_file(&ctx.sandbox_id, path).await {
            Ok(result) if result.success => {
                StepResult::success(result.content).with_metadata(json!({"size": result.size, "path": result.path}))
            }
            Ok(result) => StepResult::failure(result.error.unwrap_or_else(|| "file_read: read failed".to_string())),
            Err(e) => StepResult::failure(format!("file_read: sandbox call failed: {e}")),
        }
    }
}
