//! Normalizing, parsing, and validating a model's plan response.
//!
//! Shared between the Planner and the Critic: both send the model a
//! prompt demanding a JSON array of step objects, and both must tolerate
//! the same quirks (fenced code blocks, a bare object instead of an
//! array) before validating against the registry.

use serde_json::Value;
use taskengine_registry::ToolRegistry;
use taskengine_types::{PlannerError, Step, StepId, StepStatus};

/// Strip a Markdown code fence (```` ``` ```` or ```` ```json ````) wrapping
/// the response, if present. Leaves unfenced text untouched.
pub fn strip_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse a model response into a validated list of steps, ready to become
/// (part of) a task's plan.
///
/// Normalization order: strip fences, parse as JSON, wrap a bare object
/// into a single-element array, then validate every element. A validation
/// or parse failure raises [`PlannerError`] — deliberately loud, since a
/// malformed-in-substance plan must never execute.
pub fn parse_plan_response(response: &str, registry: &ToolRegistry, generation: u32) -> Result<Vec<Step>, PlannerError> {
    let stripped = strip_fences(response);
    let value: Value = serde_json::from_str(stripped).map_err(|e| PlannerError::Unparseable(e.to_string()))?;

    let elements = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        other => return Err(PlannerError::Unparseable(format!("expected a JSON array or object, got {other}"))),
    };

    if elements.is_empty() {
        return Err(PlannerError::EmptyPlan);
    }

    elements.into_iter().map(|element| validate_step(element, registry, generation)).collect()
}

fn validate_step(element: Value, registry: &ToolRegistry, generation: u32) -> Result<Step, PlannerError> {
    let Value::Object(mut obj) = element else {
        return Err(PlannerError::InvalidStep(format!("step must be an object, got {element}")));
    };

    let id = obj
        .remove("id")
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| PlannerError::InvalidStep("step missing required field 'id'".to_string()))?;

    let description = obj
        .remove("description")
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| PlannerError::InvalidStep(format!("step '{id}' missing required field 'description'")))?;

    let tool = obj
        .remove("tool")
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| PlannerError::InvalidStep(format!("step '{id}' missing required field 'tool'")))?;

    if !registry.has(&tool) {
        return Err(PlannerError::InvalidStep(format!("step '{id}' references unknown tool '{tool}'")));
    }

    let arguments = obj.remove("arguments").unwrap_or(Value::Object(Default::default()));
    let success_criterion = obj.remove("success_criterion").and_then(|v| v.as_str().map(str::to_string));
    let required = obj.remove("required").and_then(|v| v.as_bool()).unwrap_or(true);

    Ok(Step {
        id: StepId::new(id),
        description,
        tool,
        arguments,
        success_criterion,
        required,
        status: StepStatus::Pending,
        result: None,
        generation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use taskengine_registry::{ToolContext, ToolHandler};
    use taskengine_types::StepResult;

    struct Noop;

    #[async_trait]
    impl ToolHandler for Noop {
        fn description(&self) -> &str {
            "noop"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn invoke(&self, _arguments: Value, _ctx: &ToolContext) -> StepResult {
            StepResult::success("")
        }
    }

    fn registry_with_shell() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        r.register("shell", Arc::new(Noop));
        r
    }

    #[test]
    fn strips_plain_fence() {
        assert_eq!(strip_fences("```\n[1,2]\n```"), "[1,2]");
    }

    #[test]
    fn strips_json_tagged_fence() {
        assert_eq!(strip_fences("```json\n[1,2]\n```"), "[1,2]");
    }

    #[test]
    fn leaves_unfenced_text_untouched() {
        assert_eq!(strip_fences("[1,2]"), "[1,2]");
    }

    #[test]
    fn parses_a_valid_array() {
        let registry = registry_with_shell();
        let response = r#"[{"id":"s1","description":"do it","tool":"shell","arguments":{"command":"echo hi"}}]"#;
        let steps = parse_plan_response(response, &registry, 0).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].tool, "shell");
        assert_eq!(steps[0].status, StepStatus::Pending);
        assert!(steps[0].required);
    }

    #[test]
    fn wraps_a_bare_object_into_an_array() {
        let registry = registry_with_shell();
        let response = r#"{"id":"s1","description":"do it","tool":"shell","arguments":{}}"#;
        let steps = parse_plan_response(response, &registry, 0).unwrap();
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn unfences_then_parses() {
        let registry = registry_with_shell();
        let response = "```json\n[{\"id\":\"s1\",\"description\":\"d\",\"tool\":\"shell\",\"arguments\":{}}]\n```";
        let steps = parse_plan_response(response, &registry, 0).unwrap();
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn empty_array_is_a_planning_error() {
        let registry = registry_with_shell();
        let err = parse_plan_response("[]", &registry, 0).unwrap_err();
        assert!(matches!(err, PlannerError::EmptyPlan));
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let registry = registry_with_shell();
        let response = r#"[{"id":"s1","description":"d","tool":"not_a_tool","arguments":{}}]"#;
        let err = parse_plan_response(response, &registry, 0).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidStep(_)));
    }

    #[test]
    fn missing_field_is_rejected() {
        let registry = registry_with_shell();
        let response = r#"[{"id":"s1","tool":"shell","arguments":{}}]"#;
        let err = parse_plan_response(response, &registry, 0).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidStep(_)));
    }

    #[test]
    fn malformed_json_is_unparseable() {
        let registry = registry_with_shell();
        let err = parse_plan_response("not json", &registry, 0).unwrap_err();
        assert!(matches!(err, PlannerError::Unparseable(_)));
    }

    #[test]
    fn generation_is_stamped_on_every_step() {
        let registry = registry_with_shell();
        let response = r#"[{"id":"s1","description":"d","tool":"shell","arguments":{}}]"#;
        let steps = parse_plan_response(response, &registry, 2).unwrap();
        assert_eq!(steps[0].generation, 2);
    }

    #[test]
    fn required_defaults_true_but_can_be_overridden() {
        let registry = registry_with_shell();
        let response = r#"[{"id":"s1","description":"d","tool":"shell","arguments":{},"required":false}]"#;
        let steps = parse_plan_response(response, &registry, 0).unwrap();
        assert!(!steps[0].required);
    }
}
