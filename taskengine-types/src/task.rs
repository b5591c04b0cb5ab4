//! The durable record of one autonomously executed goal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::Artifact;
use crate::event::Event;
use crate::id::TaskId;
use crate::step::Step;

/// Terminal and non-terminal task status. Transitions form the DAG
/// `queued -> running -> {succeeded, failed, cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted, not yet picked up by a worker.
    Queued,
    /// A worker has dispatched this task to an Orchestrator.
    Running,
    /// Every step in the final plan completed, or only non-required steps failed.
    Succeeded,
    /// A required step failed, or planning/sandbox acquisition failed.
    Failed,
    /// Cancelled while queued or running.
    Cancelled,
}

impl TaskStatus {
    /// A terminal status permits no further mutation except as noted on `Task`.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Cancelled)
    }
}

/// The durable record of one autonomously executed goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Opaque identity.
    pub id: TaskId,
    /// The natural-language goal submitted by the caller.
    pub goal: String,
    /// Caller-supplied key/value context, passed through to the Planner prompt.
    #[serde(default)]
    pub context: Value,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// The plan, once the Planner has produced one. `None` before planning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<Step>>,
    /// Append-only event history.
    #[serde(default)]
    pub events: Vec<Event>,
    /// Artifacts produced by successful step executions.
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    /// Milliseconds since the Unix epoch when the task was submitted.
    pub created_at_ms: u64,
    /// Set when a worker begins running the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    /// Set when the task reaches a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    /// Human-readable error text, set only when `status` is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    /// Construct a freshly queued task with no plan, events, or artifacts.
    pub fn new(id: TaskId, goal: impl Into<String>, context: Value, created_at_ms: u64) -> Self {
        Self {
            id,
            goal: goal.into(),
            context,
            status: TaskStatus::Queued,
            plan: None,
            events: Vec::new(),
            artifacts: Vec::new(),
            created_at_ms,
            started_at_ms: None,
            completed_at_ms: None,
            error: None,
        }
    }

    /// Append an event to the task's history. Callers must not call this
    /// once the task has reached a terminal status; the event log append
    /// rule (terminal tasks forbid further event-log mutation) is enforced
    /// by the Orchestrator, not by this type.
    pub fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Every step ID currently in the plan is unique. Used by tests and by
    /// the Orchestrator after correction splicing.
    pub fn has_unique_step_ids(&self) -> bool {
        let Some(plan) = &self.plan else { return true };
        let mut seen = std::collections::HashSet::new();
        plan.iter().all(|s| seen.insert(s.id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::StepId;
    use crate::step::Step;

    #[test]
    fn fresh_task_is_queued_with_no_plan() {
        let t = Task::new(TaskId::generate(), "do a thing", Value::Null, 0);
        assert_eq!(t.status, TaskStatus::Queued);
        assert!(t.plan.is_none());
        assert!(t.events.is_empty());
    }

    #[test]
    fn detects_duplicate_step_ids() {
        let mut t = Task::new(TaskId::generate(), "goal", Value::Null, 0);
        let dup = StepId::new("s1");
        t.plan = Some(vec![
            Step::new(dup.clone(), "a", "shell", serde_json::json!({})),
            Step::new(dup, "b", "shell", serde_json::json!({})),
        ]);
        assert!(!t.has_unique_step_ids());
    }

    #[test]
    fn terminal_statuses() {
        assert!(TaskStatus::Succeeded.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }
}
