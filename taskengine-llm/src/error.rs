//! Errors raised by an [`crate::LlmProvider`] call.

use thiserror::Error;

/// Errors a language-model call can fail with. The Planner and Critic each
/// map this into their own error taxonomy (`PlannerError::ModelUnreachable`,
/// `CriticError::ModelUnreachable`, etc.) rather than propagating it directly.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LlmError {
    /// The endpoint could not be reached (connection refused, DNS failure, timeout).
    #[error("llm endpoint unreachable: {0}")]
    Unreachable(String),

    /// The endpoint responded with a non-2xx status.
    #[error("llm endpoint returned status {status}: {body}")]
    BadResponse {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// The response body could not be parsed into the expected shape.
    #[error("llm response unparseable: {0}")]
    Unparseable(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
