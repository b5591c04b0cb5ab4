//! Errors raised by the reference store and queue.

use taskengine_types::TaskStatus;
use thiserror::Error;

/// Errors a [`crate::TaskStore`] call can fail with.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// No task is recorded under the requested ID.
    #[error("task not found: {0}")]
    NotFound(String),

    /// A compare-and-set status update observed a different current status
    /// than the caller expected.
    #[error("compare-and-set failed on task {task}: expected {expected:?}, found {found:?}")]
    CasFailed {
        /// The task the update targeted.
        task: String,
        /// The status the caller expected to find.
        expected: Option<TaskStatus>,
        /// The status actually found.
        found: TaskStatus,
    },

    /// An event-log append was attempted against a task that has already
    /// reached a terminal status; forbidden per the data model invariant.
    #[error("event log append rejected: task {0} is already terminal")]
    TerminalAppendRejected(String),
}
