//! The isolated, disposable execution environment bound to one task.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::SandboxId;

/// Lifecycle status of a sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxStatus {
    /// Container start requested; health probes have not all passed yet.
    Creating,
    /// All health probes passed; façade calls may be made.
    Running,
    /// Destroyed (or destruction in progress).
    Stopped,
    /// Create failed, or a façade call observed the container has crashed.
    Error,
}

/// Named in-sandbox services and the host port each is bound to.
pub type PortMap = HashMap<String, u16>;

/// An isolated, disposable execution environment bound to one task.
///
/// Owned exclusively by the Orchestrator that created it; the Sandbox
/// Manager's lookup table is a weak reference, not an owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sandbox {
    /// Identity, derived from the owning task's ID by default.
    pub id: SandboxId,
    /// Backing container identity (e.g. a Docker container ID), once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    /// Current lifecycle status.
    pub status: SandboxStatus,
    /// Milliseconds since the Unix epoch when the sandbox was created.
    pub created_at_ms: u64,
    /// Logical service name ("shell", "file", "browser") to host-side port.
    #[serde(default)]
    pub ports: PortMap,
    /// Milliseconds since the Unix epoch at which this sandbox will be
    /// force-destroyed if it has not already been released.
    pub destroy_deadline_ms: u64,
}

impl Sandbox {
    /// Construct a sandbox record in the `Creating` state with no ports yet.
    pub fn creating(id: SandboxId, created_at_ms: u64, destroy_deadline_ms: u64) -> Self {
        Self {
            id,
            container_id: None,
            status: SandboxStatus::Creating,
            created_at_ms,
            ports: PortMap::new(),
            destroy_deadline_ms,
        }
    }
}
