//! `browser`: drives the sandbox's headless-browser service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use taskengine_types::{Artifact, ArtifactKind, DurationMs, StepResult};

use taskengine_registry::{ToolContext, ToolHandler};
use taskengine_sandbox::{BrowserAction, SandboxManager};

/// `{action, url, selector?, instructions?, timeout?}` → result shape
/// depends on `action`: title+text for `read`, a base64 PNG artifact for
/// `screenshot`, a table matrix for `extract_table`, a URL confirmation
/// for `open`/`click`/`fill_form`.
pub struct BrowserTool {
    sandbox: Arc<dyn SandboxManager>,
}

impl BrowserTool {
    /// Construct a browser adapter atop the given sandbox manager.
    pub fn new(sandbox: Arc<dyn SandboxManager>) -> Self {
        Self { sandbox }
    }
}

fn parse_action(arguments: &Value, default_timeout: DurationMs) -> Result<BrowserAction, String> {
    let action = arguments.get("action").and_then(Value::as_str).ok_or("browser: missing required field 'action'")?;
    let url = arguments
        .get("url")
        .and_then(Value::as_str)
        .ok_or("browser: missing required field 'url'")?
        .to_string();
    let timeout = arguments.get("timeout").and_then(Value::as_u64).map(DurationMs::from_millis).unwrap_or(default_timeout);

    Ok(match action {
        "open" => BrowserAction::Open { url, timeout },
        "read" => BrowserAction::Read { url, timeout },
        "screenshot" => BrowserAction::Screenshot { url, timeout },
        "extract_table" => {
            let selector = arguments
                .get("selector")
                .and_then(Value::as_str)
                .ok_or("browser: extract_table requires 'selector'")?
                .to_string();
            BrowserAction::ExtractTable { url, selector, timeout }
        }
        "click" => {
            let selector = arguments
                .get("selector")
                .and_then(Value::as_str)
                .ok_or("browser: click requires 'selector'")?
                .to_string();
            BrowserAction::Click { url, selector, timeout }
        }
        "fill_form" => {
            let instructions = arguments
                .get("instructions")
                .and_then(Value::as_str)
                .ok_or("browser: fill_form requires 'instructions'")?
                .to_string();
            BrowserAction::FillForm { url, instructions, timeout }
        }
        other => return Err(format!("browser: unknown action '{other}'")),
    })
}

#[async_trait]
impl ToolHandler for BrowserTool {
    fn description(&self) -> &str {
        "Drives a headless browser inside the task's sandbox: open, read, screenshot, extract_table, click, fill_form."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {"type": "string", "enum": ["open", "read", "screenshot", "extract_table", "click", "fill_form"]},
                "url": {"type": "string"},
                "selector": {"type": "string"},
                "instructions": {"type": "string"},
                "timeout": {"type": "integer", "description": "milliseconds"}
            },
            "required": ["action", "url"]
        })
    }

    async fn invoke(&self, arguments: Value, ctx: &ToolContext) -> StepResult {
        let action = match parse_action(&arguments, ctx.default_timeout) {
            Ok(action) => action,
            Err(e) => return StepResult::failure(e),
        };

        tracing::debug!(sandbox = %ctx.sandbox_id, action = action.tag(), url = %action.url(), "taskengine.tools.browser.invoke");

        let result = match self.sandbox.execute_browser(&ctx.sandbox_id, action.clone()).await {
            Ok(result) => result,
            Err(e) => return StepResult::failure(format!("browser: sandbox call failed: {e}")),
        };

        if !result.success {
            return StepResult::failure(result.error.unwrap_or_else(|| "browser: action failed".to_string()));
        }

        match action {
            BrowserAction::Read { .. } => {
                let text = result.text.clone().unwrap_or_default();
                StepResult::success(text).with_metadata(json!({"title": result.title, "url": result.url}))
            }
            BrowserAction::Screenshot { .. } => {
                let data = result.screenshot_base64.clone().unwrap_or_default();
                StepResult::success("captured screenshot").with_artifacts(vec![Artifact {
                    kind: ArtifactKind::Data,
                    path: None,
                    url: result.url.clone(),
                    content: Some(data),
                    metadata: json!({"format": "png;base64"}),
                }])
            }
            BrowserAction::ExtractTable { .. } => {
                let table = result.table.clone().unwrap_or_default();
                StepResult::success(format!("extracted {} rows", table.len()))
                    .with_metadata(json!({"table": table, "url": result.url}))
            }
            BrowserAction::Open { .. } | BrowserAction::Click { .. } | BrowserAction::FillForm { .. } => {
                StepResult::success(format!("ok: {}", result.url.unwrap_or_default()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskengine_sandbox_ref::ReferenceSandboxManager;
    use taskengine_types::{DurationMs, SandboxId, TaskId};
    use tokio_util::sync::CancellationToken;

    async fn sandbox_with_ctx() -> (Arc<dyn SandboxManager>, ToolContext) {
        let mgr: Arc<dyn SandboxManager> = Arc::new(ReferenceSandboxManager::new());
        let id = SandboxId::new("sbx-browser-test");
        mgr.create(&id, &Default::default(), &CancellationToken::new()).await.unwrap();
        let ctx = ToolContext::new(id.clone(), TaskId::new("t"), DurationMs::from_secs(5));
        (mgr, ctx)
    }

    #[tokio::test]
    async fn read_action_returns_text() {
        let (mgr, ctx) = sandbox_with_ctx().await;
        let tool = BrowserTool::new(mgr);
        let result = tool.invoke(json!({"action": "read", "url": "https://example.com"}), &ctx).await;
        assert!(result.success);
        assert!(!result.output.is_empty());
    }

    #[tokio::test]
    async fn extract_table_without_selector_fails() {
        let (mgr, ctx) = sandbox_with_ctx().await;
        let tool = BrowserTool::new(mgr);
        let result = tool.invoke(json!({"action": "extract_table", "url": "https://example.com"}), &ctx).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn unknown_action_fails() {
        let (mgr, ctx) = sandbox_with_ctx().await;
        let tool = BrowserTool::new(mgr);
        let result = tool.invoke(json!({"action": "teleport", "url": "https://example.com"}), &ctx).await;
        assert!(!result.success);
    }

    #[test]
    fn parse_action_uses_explicit_timeout_over_the_context_default() {
        let action = parse_action(
            &json!({"action": "open", "url": "https://example.com", "timeout": 9000}),
            DurationMs::from_secs(5),
        )
        .unwrap();
        assert_eq!(action.timeout(), DurationMs::from_millis(9000));
    }

    #[test]
    fn parse_action_falls_back_to_the_context_default_timeout() {
        let action = parse_action(&json!({"action": "open", "url": "https://example.com"}), DurationMs::from_secs(5)).unwrap();
        assert_eq!(action.timeout(), DurationMs::from_secs(5));
    }
}
