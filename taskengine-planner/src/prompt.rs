//! Prompt construction for the Planner's single model call.

use serde_json::Value;
use taskengine_registry::ToolRegistry;

/// Build the single prompt sent to the language model: a fixed instruction
/// block, the registry's tool descriptions, an output format
/// specification demanding a JSON array only, and the goal plus context.
pub fn build_prompt(goal: &str, context: &Value, registry: &ToolRegistry) -> String {
    let tools = registry
        .describe()
        .into_iter()
        .map(|def| format!("- {} : {}\n  input_schema: {}", def.name, def.description, def.input_schema))
        .collect::<Vec<_>>()
        .join("\n");

    let context_block = if context.is_null() {
        "(none)".to_string()
    } else {
        context.to_string()
    };

    format!(
        "You are an autonomous task-planning agent. Given a goal, produce an ordered \
         plan of tool invocations that accomplishes it. Use only the tools listed below.\n\n\
         Available tools:\n{tools}\n\n\
         Respond with a JSON array ONLY, no prose, no Markdown fences. Each element must be \
         an object with fields: id (string, unique), description (string), tool (string, must \
         be one of the tool names above), arguments (object matching the tool's input_schema), \
         success_criterion (string, optional), required (boolean, optional, defaults to true).\n\n\
         Goal: {goal}\n\
         Context: {context_block}\n"
    )
}
