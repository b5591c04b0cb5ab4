//! The append-only per-task event log.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of event tags a task's history may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskStarted,
    SandboxCreated,
    PlanningStarted,
    PlanGenerated,
    ExecutionStarted,
    StepStarted,
    StepCompleted,
    CriticEvaluation,
    CorrectionApplied,
    ExecutionStopped,
    TaskSucceeded,
    TaskCompletedWithFailures,
    TaskFailed,
    OrchestrationFailed,
    SandboxDestroyed,
}

/// One timestamped, typed entry in a task's append-only history.
///
/// Per-task total order equals the wall-clock order observed by the
/// owning Orchestrator; across tasks no ordering is promised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Milliseconds since the Unix epoch, assigned by the Orchestrator at append time.
    pub timestamp_ms: u64,
    /// The event's tag.
    pub kind: EventKind,
    /// Free-form payload specific to `kind`.
    #[serde(default)]
    pub data: Value,
}

impl Event {
    /// Construct an event with the given payload.
    pub fn new(kind: EventKind, timestamp_ms: u64, data: Value) -> Self {
        Self {
            timestamp_ms,
            kind,
            data,
        }
    }
}
