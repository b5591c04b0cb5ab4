//! In-memory [`LlmProvider`] test doubles.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::LlmError;
use crate::provider::LlmProvider;

/// Returns a fixed response to every call, or an error if configured to fail.
///
/// Records every prompt it was called with, for assertions in Planner/Critic
/// unit tests — the same posture the corpus uses for its mock providers.
pub struct MockLlmProvider {
    response: Mutex<Result<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl MockLlmProvider {
    /// Construct a mock that always succeeds with `response`.
    pub fn returning(response: impl Into<String>) -> Self {
        Self {
            response: Mutex::new(Ok(response.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Construct a mock that always fails with an unreachable error.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            response: Mutex::new(Err(message.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every prompt this mock has been called with, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, prompt: &str, _model: &str, cancel: &CancellationToken) -> Result<String, LlmError> {
        if cancel.is_cancelled() {
            return Err(LlmError::Unreachable("cancelled".to_string()));
        }
        self.calls.lock().expect("mock lock poisoned").push(prompt.to_string());
        self.response.lock().expect("mock lock poisoned").clone().map_err(LlmError::Unreachable)
    }
}
