//! `file_list`: lists a directory in the sandbox's `/work` filesystem.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use taskengine_types::StepResult;

use taskengine_registry::{ToolContext, ToolHandler};
use taskengine_sandbox::SandboxManager;

/// `{path?}` → a human-readable listing as `result.output`; structured
/// entries carried in `metadata.files`.
pub struct FileListTool {
    sandbox: Arc<dyn SandboxManager>,
}

impl FileListTool {
    /// Construct a file-list adapter atop the given sandbox manager.
    pub fn new(sandbox: Arc<dyn SandboxManager>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl ToolHandler for FileListTool {
    fn description(&self) -> &str {
        "Lists the files and directories at a path in the task's sandbox."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"path": {"type": "string"}}
        })
    }

    async fn invoke(&self, arguments: Value, ctx: &ToolContext) -> StepResult {
        let path = arguments.get("path").and_then(Value::as_str).unwrap_or("");

        tracing::debug!(sandbox = %ctx.sandbox_id, path = %path, "taskengine.tools.file_list.invoke");

        match self.sandbox.list_directory(&ctx.sandbox_id, path).await {
            Ok(result) if result.success => {
                let mut output = format!("{}:\n", result.path);
                for entry in &result.files {
                    let marker = match entry.kind {
                        taskengine_sandbox::FileEntryKind::Directory => "/",
                        taskengine_sandbox::FileEntryKind::File => "",
                    };
                    let _ = writeln!(output, "  {}{marker} ({} bytes)", entry.name, entry.size);
                }
                StepResult::success(output).with_metadata(json!({"files": result.files, "path": result.path}))
            }
            Ok(result) => StepResult::failure(result.error.unwrap_or_else(|| "file_list: listing failed".to_string())),
            Err(e) => StepResult::failure(format!("file_list: sandbox call failed: {e}")),
        }
    }
}
