//! Error taxonomy for the task orchestration engine, one enum per component.

use thiserror::Error;

/// Errors raised while registering or invoking a tool (C1/C3).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool is registered under the requested name.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// The tool's input failed schema validation.
    #[error("invalid input for tool {tool}: {message}")]
    InvalidInput {
        /// Name of the tool.
        tool: String,
        /// Validation failure message.
        message: String,
    },

    /// The tool ran but failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by the Sandbox Manager (C2).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The container failed to start or its health probes never passed.
    #[error("sandbox create failed: {0}")]
    CreateFailed(String),

    /// The requested sandbox ID is not in the lookup table.
    #[error("sandbox not found: {0}")]
    NotFound(String),

    /// A façade call (shell/file/browser) failed in transport or parsing.
    #[error("sandbox call failed: {0}")]
    CallFailed(String),

    /// The façade call was rejected by policy (command blocklist, path denylist).
    #[error("policy rejected: {0}")]
    PolicyRejected(String),

    /// Destroying the sandbox's container failed. Non-fatal: the lookup
    /// entry is still removed before this error is ever observed.
    #[error("sandbox destroy failed: {0}")]
    DestroyFailed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by the Planner (C4).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The language-model endpoint could not be reached or returned an error.
    #[error("planner model unreachable: {0}")]
    ModelUnreachable(String),

    /// The model's response could not be parsed as a plan after normalization.
    #[error("planner response unparseable: {0}")]
    Unparseable(String),

    /// A parsed step failed validation (missing field, unknown tool).
    #[error("invalid step: {0}")]
    InvalidStep(String),

    /// The model produced a plan with zero steps.
    #[error("planner produced an empty plan")]
    EmptyPlan,

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by the Critic (C6). Always non-fatal to the Orchestrator;
/// this type exists so the Critic can report *why* it fell back to the
/// optimistic default, for logging.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CriticError {
    /// The critic's model call failed.
    #[error("critic model unreachable: {0}")]
    ModelUnreachable(String),

    /// The critic's response could not be parsed.
    #[error("critic response unparseable: {0}")]
    Unparseable(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by the Orchestrator (C7). These are the only errors that
/// cause an `orchestration_failed` event and propagate to the Worker Loop.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Sandbox acquisition failed; fatal to the task.
    #[error("sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    /// Planning failed; fatal to the task.
    #[error("planner error: {0}")]
    Planner(#[from] PlannerError),

    /// The task was cancelled while running.
    #[error("task cancelled")]
    Cancelled,

    /// Catch-all for unhandled infrastructure issues surfaced mid-task.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by the Worker Loop (C8).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum WorkerError {
    /// An orchestration run failed.
    #[error("orchestration failed: {0}")]
    Orchestration(#[from] OrchestratorError),

    /// The external queue or durable store misbehaved.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
