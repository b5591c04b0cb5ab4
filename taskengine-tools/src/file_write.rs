//! `file_write`: writes a file into the sandbox's `/work` filesystem.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use taskengine_types::{Artifact, StepResult};

use taskengine_registry::{ToolContext, ToolHandler};
use taskengine_sandbox::SandboxManager;

/// `{path, content}` → creates parent directories as needed and writes
/// `content`. `result.output` is a confirmation string; a `file` artifact
/// with path + size is attached on success.
pub struct FileWriteTool {
    sandbox: Arc<dyn SandboxManager>,
}

impl FileWriteTool {
    /// Construct a file-write adapter atop the given sandbox manager.
    pub fn new(sandbox: Arc<dyn SandboxManager>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl ToolHandler for FileWriteTool {
    fn description(&self) -> &str {
        "Writes content to a file in the task's sandbox, creating parent directories as needed."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string"},
                "content": {"type": "string"}
            },
            "required": ["path", "content"]
        })
    }

    async fn invoke(&self, arguments: Value, ctx: &ToolContext) -> StepResult {
        let Some(path) = arguments.get("path").and_then(Value::as_str) else {
            return StepResult::failure("file_write: missing required field 'path'");
        };
        let Some(content) = arguments.get("content").and_then(Value::as_str) else {
            return StepResult::failure("file_write: missing required field 'content'");
        };

        tracing::debug!(sandbox = %ctx.sandbox_id, path = %path, "taskengine.tools.file_write.invoke");

        match self.sandbox.write_file(&ctx.sandbox_id, path, content).await {
            Ok(result) if result.success => StepResult::success(format!("wrote {} bytes to {}", result.size, result.path))
                .with_metadata(json!({"size": result.size, "path": result.path}))
                .with_artifacts(vec![Artifact::file(result.path, result.size)]),
            Ok(result) => StepResult::failure(result.error.unwrap_or_else(|| "file_write: write failed".to_string())),
            Err(e) => StepResult::failure(format!("file_write: sandbox call failed: {e}")),
        }
    }
}
