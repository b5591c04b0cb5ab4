#![deny(missing_docs)]
//! # taskengine-tools — the five canonical Tool Adapters (C3)
//!
//! Thin bridges from a registered tool name to a
//! [`taskengine_sandbox::SandboxManager`] call: translate a step's argument
//! bag into a façade call, normalize the façade's result into a uniform
//! [`taskengine_types::StepResult`]. Adapters never enforce policy
//! themselves — the command blocklist and path denylist live in the
//! Sandbox Manager / in-sandbox services (defense in depth) — adapters
//! only truncate output and shape results.

pub mod browser;
pub mod file_list;
pub mod file_read;
pub mod file_write;
pub mod shell;

pub use browser::BrowserTool;
pub use file_list::FileListTool;
pub use file_read::FileReadTool;
pub use file_write::FileWriteTool;
pub use shell::ShellTool;

/// Shell output is truncated to this many characters, per §6.
pub const SHELL_OUTPUT_LIMIT: usize = 10_000;

/// Truncate `text` to `limit` characters, appending an explicit marker
/// when truncation occurred. Operates on chars, not bytes, so the marker
/// is never inserted mid-codepoint.
pub fn truncate_with_marker(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let truncated: String = text.chars().take(limit).collect();
    format!("{truncated}\n...[truncated, {} characters total]", text.chars().count())
}

/// Register all five canonical tools atop the given sandbox manager into `registry`.
pub fn register_all(
    registry: &mut taskengine_registry::ToolRegistry,
    sandbox: std::sync::Arc<dyn taskengine_sandbox::SandboxManager>,
) {
    registry.register("shell", std::sync::Arc::new(ShellTool::new(sandbox.clone())));
    registry.register("file_read", std::sync::Arc::new(FileReadTool::new(sandbox.clone())));
    registry.register("file_write", std::sync::Arc::new(FileWriteTool::new(sandbox.clone())));
    registry.register("file_list", std::sync::Arc::new(FileListTool::new(sandbox.clone())));
    registry.register("browser", std::sync::Arc::new(BrowserTool::new(sandbox)));
}
