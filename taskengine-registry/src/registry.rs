//! The flat, process-wide tool registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::{ToolDefinition, ToolHandler};

/// Process-wide mapping from tool name to handler.
///
/// `register` is idempotent on name: a second registration under the same
/// name overwrites the first and logs a warning, rather than erroring —
/// rejection here is a policy decision for callers to make, not something
/// the registry enforces.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool under the given name, overwriting any existing
    /// registration with the same name.
    pub fn register(&mut self, name: impl Into<String>, tool: Arc<dyn ToolHandler>) {
        let name = name.into();
        if self.tools.contains_key(&name) {
            tracing::warn!(tool = %name, "taskengine.registry.overwrite");
        }
        self.tools.insert(name, tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).cloned()
    }

    /// Whether a tool is registered under this name.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All registered tool names.
    pub fn all(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Tool definitions for the Planner's prompt: `{name, description, schema}`
    /// for every registered tool.
    pub fn describe(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .iter()
            .map(|(name, tool)| ToolDefinition {
                name: name.clone(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}
