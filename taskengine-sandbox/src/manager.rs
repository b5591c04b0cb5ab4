//! The [`SandboxManager`] lifecycle and façade contract.

use async_trait::async_trait;
use taskengine_types::{Sandbox, SandboxError, SandboxId};
use tokio_util::sync::CancellationToken;

use crate::config::SandboxCreateConfig;
use crate::facade::{
    BrowserAction, BrowserCallResult, FileListCallResult, FileReadCallResult,
    FileWriteCallResult, ShellCallResult, ShellOptions,
};

/// Creates, tracks, and destroys isolated execution environments; exposes
/// RPC-style façades (shell, file, browser) keyed by sandbox ID.
///
/// Implementations back this with a real container runtime
/// ([`crate::docker::DockerSandboxManager`]) or an in-process test double
/// (`taskengine-sandbox-ref`); the Orchestrator, Executor, and Tool
/// Adapters depend only on this trait.
#[async_trait]
pub trait SandboxManager: Send + Sync {
    /// Create and health-probe a sandbox. `cancel` is honored at every
    /// suspension point (image pull, container start, the health-probe
    /// loop); a cancellation mid-create tears down any partial container.
    async fn create(
        &self,
        id: &SandboxId,
        config: &SandboxCreateConfig,
        cancel: &CancellationToken,
    ) -> Result<Sandbox, SandboxError>;

    /// Look up the live sandbox record, if any.
    async fn get(&self, id: &SandboxId) -> Option<Sandbox>;

    /// Stop then remove the sandbox's container. Idempotent: destroying an
    /// unknown sandbox is a no-op, not an error — the lookup entry is
    /// removed before the destructive call is made, so a crashed destroy
    /// cannot double-free.
    async fn destroy(&self, id: &SandboxId) -> Result<(), SandboxError>;

    /// Run a command in the sandbox's shell service. Never retries.
    async fn execute_shell(
        &self,
        id: &SandboxId,
        command: &str,
        opts: ShellOptions,
    ) -> Result<ShellCallResult, SandboxError>;

    /// Read a file via the sandbox's file service.
    async fn read_file(&self, id: &SandboxId, path: &str) -> Result<FileReadCallResult, SandboxError>;

    /// Write a file via the sandbox's file service, creating parent
    /// directories as needed.
    async fn write_file(
        &self,
        id: &SandboxId,
        path: &str,
        content: &str,
    ) -> Result<FileWriteCallResult, SandboxError>;

    /// List a directory via the sandbox's file service.
    async fn list_directory(&self, id: &SandboxId, path: &str) -> Result<FileListCallResult, SandboxError>;

    /// Perform a browser action via the sandbox's browser service.
    async fn execute_browser(
        &self,
        id: &SandboxId,
        action: BrowserAction,
    ) -> Result<BrowserCallResult, SandboxError>;
}
