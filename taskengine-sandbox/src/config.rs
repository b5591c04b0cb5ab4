//! Per-create configuration for a sandbox's container and resource limits.

use taskengine_types::DurationMs;

/// Resource limits and image selection for one sandbox's container.
///
/// Mirrors the normative §4.2 create contract: CPU/memory caps, dropped
/// capabilities, no-new-privileges, read-only root with writable tmpfs for
/// `/tmp` and `/work`, and a bounded health-probe retry budget.
#[derive(Debug, Clone)]
pub struct SandboxCreateConfig {
    /// Container image to start.
    pub image: String,
    /// Fractional CPU cap (e.g. `1.0` = one core).
    pub cpu_limit: f64,
    /// Memory cap in bytes.
    pub memory_limit_bytes: u64,
    /// Size of the writable `/work` tmpfs, in bytes.
    pub work_tmpfs_bytes: u64,
    /// Size of the writable `/tmp` tmpfs, in bytes.
    pub tmp_tmpfs_bytes: u64,
    /// Whether to start the in-sandbox browser service in addition to
    /// shell and file.
    pub enable_browser: bool,
    /// Health-probe attempts before create is considered fatally failed.
    pub health_probe_attempts: u32,
    /// Interval between health-probe attempts.
    pub health_probe_interval: DurationMs,
    /// Wall-clock budget after which the sandbox is force-destroyed if
    /// still alive (`now + timeout`, armed at create time).
    pub destroy_deadline: DurationMs,
    /// Per-operation budget for each of stop/remove during `destroy`.
    pub stop_remove_budget: DurationMs,
}

impl Default for SandboxCreateConfig {
    fn default() -> Self {
        Self {
            image: "taskengine-sandbox:latest".to_string(),
            cpu_limit: 1.0,
            memory_limit_bytes: 512 * 1024 * 1024,
            work_tmpfs_bytes: 256 * 1024 * 1024,
            tmp_tmpfs_bytes: 64 * 1024 * 1024,
            enable_browser: false,
            health_probe_attempts: 30,
            health_probe_interval: DurationMs::from_secs(1),
            destroy_deadline: DurationMs::from_secs(3600),
            stop_remove_budget: DurationMs::from_secs(10),
        }
    }
}

impl SandboxCreateConfig {
    /// Build a config from an [`taskengine_types::EngineConfig`], keeping
    /// its health-probe and destroy-timeout knobs in sync.
    pub fn from_engine_config(engine: &taskengine_types::EngineConfig) -> Self {
        Self {
            image: engine.sandbox_image.clone(),
            health_probe_attempts: engine.health_probe_attempts,
            health_probe_interval: engine.health_probe_interval,
            destroy_deadline: engine.task_timeout,
            stop_remove_budget: engine.sandbox_destroy_timeout,
            ..Default::default()
        }
    }
}
