//! The durable task store contract, reduced to what the Orchestrator and
//! Worker Loop need: create, point lookup, paged listing, a
//! compare-and-set status transition, plan/step mutation, and append-only
//! event and artifact logs.

use async_trait::async_trait;
use taskengine_types::{Artifact, Event, Step, Task, TaskId, TaskStatus};

use crate::error::StoreError;

/// A key-value / relational store offering compare-and-set task updates
/// and an append-only event log, per the out-of-scope collaborator
/// described in the purpose and scope.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a freshly queued task. Overwrites any existing record under
    /// the same ID — callers are expected to generate fresh IDs.
    async fn create(&self, task: Task) -> Result<(), StoreError>;

    /// Point lookup by ID.
    async fn get(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;

    /// Paged listing, optionally filtered by status, ordered by creation time.
    async fn list(&self, status: Option<TaskStatus>, limit: usize, offset: usize) -> Result<Vec<Task>, StoreError>;

    /// Transition a task's status, failing if its current status does not
    /// match `expected` (when given). Stamps `started_at_ms` the first
    /// time a task becomes `Running` and `completed_at_ms` when it reaches
    /// a terminal status.
    async fn update_status(
        &self,
        id: &TaskId,
        expected: Option<TaskStatus>,
        new: TaskStatus,
        now_ms: u64,
    ) -> Result<(), StoreError>;

    /// Replace a task's error text, used only when its status becomes `Failed`.
    async fn set_error(&self, id: &TaskId, error: String) -> Result<(), StoreError>;

    /// Replace the task's plan wholesale. Used for both the Planner's
    /// initial plan and the Orchestrator's correction splices.
    async fn set_plan(&self, id: &TaskId, plan: Vec<Step>) -> Result<(), StoreError>;

    /// Replace one step within the task's plan, matched by step ID.
    async fn update_step(&self, id: &TaskId, step: Step) -> Result<(), StoreError>;

    /// Append one event. Rejected once the task has reached a terminal
    /// status, per the data-model invariant that terminal tasks forbid
    /// further event-log mutation.
    async fn append_event(&self, id: &TaskId, event: Event) -> Result<(), StoreError>;

    /// Append one artifact, produced by a successful step.
    async fn append_artifact(&self, id: &TaskId, artifact: Artifact) -> Result<(), StoreError>;
}
