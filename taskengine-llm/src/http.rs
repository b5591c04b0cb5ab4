//! HTTP-backed [`LlmProvider`], speaking an Ollama-compatible `/api/generate` shape.

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::error::LlmError;
use crate::provider::LlmProvider;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Client for an Ollama-compatible completion endpoint.
///
/// ```no_run
/// use taskengine_llm::HttpLlmProvider;
///
/// let provider = HttpLlmProvider::new().base_url("http://localhost:11434");
/// ```
pub struct HttpLlmProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLlmProvider {
    /// Create a new client pointed at the default local Ollama endpoint.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

impl Default for HttpLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    async fn complete(&self, prompt: &str, model: &str, cancel: &CancellationToken) -> Result<String, LlmError> {
        let url = self.generate_url();
        let body = json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
        });

        tracing::debug!(url = %url, model = %model, "taskengine.llm.request");

        let request = self.client.post(&url).json(&body).send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(LlmError::Unreachable("cancelled".to_string())),
            result = request => result.map_err(|e| LlmError::Unreachable(e.to_string()))?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::BadResponse { status: status.as_u16(), body });
        }

        let parsed: serde_json::Value = response.json().await.map_err(|e| LlmError::Unparseable(e.to_string()))?;

        parsed
            .get("response")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LlmError::Unparseable("missing 'response' field".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_is_local_ollama() {
        let provider = HttpLlmProvider::new();
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn builder_overrides_base_url() {
        let provider = HttpLlmProvider::new().base_url("http://remote:11434");
        assert_eq!(provider.base_url, "http://remote:11434");
    }

    #[test]
    fn generate_url_includes_path() {
        let provider = HttpLlmProvider::new().base_url("http://localhost:9999");
        assert_eq!(provider.generate_url(), "http://localhost:9999/api/generate");
    }

    #[tokio::test]
    async fn unreachable_endpoint_surfaces_as_unreachable_error() {
        let provider = HttpLlmProvider::new().base_url("http://127.0.0.1:1");
        let err = provider.complete("hello", "mock-model", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, LlmError::Unreachable(_)));
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits() {
        let provider = HttpLlmProvider::new();
        let token = CancellationToken::new();
        token.cancel();
        let err = provider.complete("hello", "mock-model", &token).await.unwrap_err();
        assert!(matches!(err, LlmError::Unreachable(_)));
    }
}
