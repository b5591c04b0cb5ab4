//! The object-safe language-model provider contract.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::LlmError;

/// A language-model endpoint reduced to its essential shape for this
/// engine: a prompt in, a completion string out. Object-safe (unlike the
/// corpus's RPITIT `Provider` trait) because the Planner and Critic hold
/// their model behind an `Arc<dyn LlmProvider>` shared across tasks.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send `prompt` to `model` and return its completion text.
    /// `cancel` is honored cooperatively: an implementation should abandon
    /// the in-flight request promptly once cancellation is observed.
    async fn complete(&self, prompt: &str, model: &str, cancel: &CancellationToken) -> Result<String, LlmError>;
}
