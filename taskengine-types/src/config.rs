//! Layered configuration surface collecting every environment knob the
//! engine's components read.

use crate::duration::DurationMs;

/// Configuration for the full engine, constructible from environment
/// variables with typed defaults matching the normative values named
/// throughout the component design.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the language-model endpoint.
    pub llm_endpoint: String,
    /// Model name used for planning.
    pub planner_model: String,
    /// Model name used for critique.
    pub critic_model: String,
    /// Whether the Critic runs at all.
    pub critic_enabled: bool,
    /// Minimum confidence for an off-track critique to produce a correction.
    pub critic_confidence_threshold: f64,
    /// Connection string for the external job queue.
    pub queue_url: String,
    /// Wall-clock budget for a single task, bounding the sandbox's lifetime.
    pub task_timeout: DurationMs,
    /// Maximum number of tasks the Worker Loop runs concurrently.
    pub worker_concurrency: usize,
    /// Container image used for sandboxes.
    pub sandbox_image: String,
    /// Maximum health-probe attempts during sandbox create.
    pub health_probe_attempts: u32,
    /// Interval between health-probe attempts.
    pub health_probe_interval: DurationMs,
    /// Budget for each of stop/remove during sandbox destroy.
    pub sandbox_destroy_timeout: DurationMs,
    /// Correction-splice generations beyond which a step executes without further critique.
    pub max_correction_generation: u32,
    /// Default per-step timeout for tool invocations.
    pub step_timeout: DurationMs,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            llm_endpoint: "http://localhost:11434".to_string(),
            planner_model: "planner-default".to_string(),
            critic_model: "critic-default".to_string(),
            critic_enabled: true,
            critic_confidence_threshold: 0.7,
            queue_url: "memory://local".to_string(),
            task_timeout: DurationMs::from_secs(3600),
            worker_concurrency: 5,
            sandbox_image: "taskengine-sandbox:latest".to_string(),
            health_probe_attempts: 30,
            health_probe_interval: DurationMs::from_secs(1),
            sandbox_destroy_timeout: DurationMs::from_secs(10),
            max_correction_generation: 3,
            step_timeout: DurationMs::from_secs(30),
        }
    }
}

impl EngineConfig {
    /// Build a config from environment variables, falling back to
    /// [`EngineConfig::default`] for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            llm_endpoint: std::env::var("TASKENGINE_LLM_ENDPOINT").unwrap_or(defaults.llm_endpoint),
            planner_model: std::env::var("TASKENGINE_PLANNER_MODEL").unwrap_or(defaults.planner_model),
            critic_model: std::env::var("TASKENGINE_CRITIC_MODEL").unwrap_or(defaults.critic_model),
            critic_enabled: std::env::var("TASKENGINE_CRITIC_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.critic_enabled),
            critic_confidence_threshold: std::env::var("TASKENGINE_CRITIC_CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.critic_confidence_threshold),
            queue_url: std::env::var("TASKENGINE_QUEUE_URL").unwrap_or(defaults.queue_url),
            task_timeout: std::env::var("TASKENGINE_TASK_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(DurationMs::from_secs)
                .unwrap_or(defaults.task_timeout),
            worker_concurrency: std::env::var("TASKENGINE_WORKER_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.worker_concurrency),
            sandbox_image: std::env::var("TASKENGINE_SANDBOX_IMAGE").unwrap_or(defaults.sandbox_image),
            health_probe_attempts: std::env::var("TASKENGINE_HEALTH_PROBE_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.health_probe_attempts),
            health_probe_interval: defaults.health_probe_interval,
            sandbox_destroy_timeout: defaults.sandbox_destroy_timeout,
            max_correction_generation: std::env::var("TASKENGINE_MAX_CORRECTION_GENERATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_correction_generation),
            step_timeout: defaults.step_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_normative_values() {
        let c = EngineConfig::default();
        assert_eq!(c.worker_concurrency, 5);
        assert_eq!(c.health_probe_attempts, 30);
        assert_eq!(c.critic_confidence_threshold, 0.7);
        assert_eq!(c.task_timeout, DurationMs::from_secs(3600));
        assert_eq!(c.max_correction_generation, 3);
    }
}
