//! The bounded health-probe retry loop used by [`crate::docker::DockerSandboxManager::create`].

use taskengine_types::SandboxError;
use tokio_util::sync::CancellationToken;

/// Probe `check` repeatedly, at `interval`, until it returns `Ok(())`, the
/// retry budget is exhausted, or `cancel` fires. Exhausting the budget is a
/// fatal create error per §4.2; cancellation surfaces as
/// [`SandboxError::CreateFailed`] so the caller tears the container down.
pub async fn probe_until_healthy<F, Fut>(
    attempts: u32,
    interval: std::time::Duration,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<(), SandboxError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for attempt in 1..=attempts.max(1) {
        if cancel.is_cancelled() {
            return Err(SandboxError::CreateFailed("cancelled during health probe".to_string()));
        }
        if check().await {
            return Ok(());
        }
        tracing::debug!(attempt, attempts, "taskengine.sandbox.health_probe_retry");
        if attempt < attempts {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => {
                    return Err(SandboxError::CreateFailed("cancelled during health probe".to_string()));
                }
            }
        }
    }
    Err(SandboxError::CreateFailed(format!(
        "health probe did not pass within {attempts} attempts"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_on_first_healthy_check() {
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result = probe_until_healthy(3, std::time::Duration::from_millis(1), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { true }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_budget_and_fails() {
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result = probe_until_healthy(3, std::time::Duration::from_millis(1), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancellation_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = probe_until_healthy(30, std::time::Duration::from_secs(1), &cancel, || async { false }).await;
        assert!(result.is_err());
    }
}
