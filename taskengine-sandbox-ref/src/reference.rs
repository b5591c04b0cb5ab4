//! In-process reference [`SandboxManager`] standing in for a container
//! runtime and the three in-sandbox HTTP services, so the Sandbox Manager
//! façade and Tool Adapters can be integration-tested without Docker or a
//! live network — the same posture the corpus uses for its own in-memory
//! state-store and local-orchestration backends.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use taskengine_types::{PortMap, Sandbox, SandboxError, SandboxId, SandboxStatus};
use tokio_util::sync::CancellationToken;

use taskengine_sandbox::{
    BrowserAction, BrowserCallResult, FileEntry, FileEntryKind, FileListCallResult,
    FileReadCallResult, FileWriteCallResult, SandboxCreateConfig, SandboxManager, ShellCallResult,
    ShellOptions,
};

use crate::policy::{display_path, CommandPolicy, PathPolicy};

/// 5 MiB, the normative read/write ceiling from §6.
const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

struct SandboxState {
    sandbox: Sandbox,
    work_dir: tempfile::TempDir,
}

/// Reference [`SandboxManager`]: creates a real temp directory standing in
/// for each sandbox's `/work` tmpfs, enforces the command blocklist and
/// path denylist in-process, and executes allowed shell commands for real
/// via `tokio::process::Command` scoped to that directory. No container
/// runtime and no HTTP round trip is involved.
pub struct ReferenceSandboxManager {
    sandboxes: Mutex<HashMap<SandboxId, SandboxState>>,
    command_policy: CommandPolicy,
}

impl ReferenceSandboxManager {
    /// Construct an empty reference manager.
    pub fn new() -> Self {
        Self {
            sandboxes: Mutex::new(HashMap::new()),
            command_policy: CommandPolicy::default_blocklist(),
        }
    }

    fn path_policy_for(&self, id: &SandboxId) -> Result<PathPolicy, SandboxError> {
        let guard = self.sandboxes.lock().expect("sandbox lock poisoned");
        let state = guard.get(id).ok_or_else(|| SandboxError::NotFound(id.to_string()))?;
        Ok(PathPolicy::new(state.work_dir.path()))
    }

    fn work_dir_path(&self, id: &SandboxId) -> Result<std::path::PathBuf, SandboxError> {
        let guard = self.sandboxes.lock().expect("sandbox lock poisoned");
        let state = guard.get(id).ok_or_else(|| SandboxError::NotFound(id.to_string()))?;
        Ok(state.work_dir.path().to_path_buf())
    }
}

impl Default for ReferenceSandboxManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SandboxManager for ReferenceSandboxManager {
    async fn create(
        &self,
        id: &SandboxId,
        config: &SandboxCreateConfig,
        cancel: &CancellationToken,
    ) -> Result<Sandbox, SandboxError> {
        if cancel.is_cancelled() {
            return Err(SandboxError::CreateFailed("cancelled before create".to_string()));
        }
        let work_dir = tempfile::tempdir()
            .map_err(|e| SandboxError::CreateFailed(format!("failed to create work dir: {e}")))?;

        let created_at_ms = now_ms();
        let mut sandbox = Sandbox::creating(id.clone(), created_at_ms, created_at_ms + config.destroy_deadline.as_millis());
        sandbox.status = SandboxStatus::Running;
        sandbox.container_id = Some(format!("reference-{id}"));
        sandbox.ports = PortMap::from([("3001".to_string(), 0), ("3003".to_string(), 0)]);

        self.sandboxes.lock().expect("sandbox lock poisoned").insert(
            id.clone(),
            SandboxState {
                sandbox: sandbox.clone(),
                work_dir,
            },
        );
        tracing::info!(sandbox = %id, "taskengine.sandbox.created_reference");
        Ok(sandbox)
    }

    async fn get(&self, id: &SandboxId) -> Option<Sandbox> {
        self.sandboxes.lock().expect("sandbox lock poisoned").get(id).map(|s| s.sandbox.clone())
    }

    async fn destroy(&self, id: &SandboxId) -> Result<(), SandboxError> {
        let removed = self.sandboxes.lock().expect("sandbox lock poisoned").remove(id);
        if removed.is_none() {
            tracing::warn!(sandbox = %id, "taskengine.sandbox.destroy_unknown");
        } else {
            tracing::info!(sandbox = %id, "taskengine.sandbox.destroyed_reference");
        }
        Ok(())
    }

    async fn execute_shell(
        &self,
        id: &SandboxId,
        command: &str,
        opts: ShellOptions,
    ) -> Result<ShellCallResult, SandboxError> {
        let work_dir = self.work_dir_path(id)?;

        if let Err(reason) = self.command_policy.check(command) {
            return Ok(ShellCallResult {
                success: false,
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                error: Some(reason),
            });
        }

        let cwd = match &opts.cwd {
            Some(cwd) => self.path_policy_for(id)?.resolve(cwd).unwrap_or(work_dir.clone()),
            None => work_dir,
        };

        let mut child = match tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(c) => c,
            Err(e) => {
                return Ok(ShellCallResult {
                    success: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    error: Some(format!("failed to spawn command: {e}")),
                })
            }
        };

        let output = tokio::time::timeout(opts.timeout.to_std(), child.wait_with_output()).await;
        Ok(match output {
            Ok(Ok(output)) => ShellCallResult {
                success: output.status.success(),
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                error: if output.status.success() {
                    None
                } else {
                    Some(format!("command exited with status {}", output.status))
                },
            },
            Ok(Err(e)) => ShellCallResult {
                success: false,
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                error: Some(format!("failed to collect output: {e}")),
            },
            Err(_) => ShellCallResult {
                success: false,
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                error: Some("command timed out".to_string()),
            },
        })
    }

    async fn read_file(&self, id: &SandboxId, path: &str) -> Result<FileReadCallResult, SandboxError> {
        let policy = self.path_policy_for(id)?;
        let resolved = match policy.resolve(path) {
            Ok(p) => p,
            Err(reason) => {
                return Ok(FileReadCallResult {
                    success: false,
                    content: String::new(),
                    size: 0,
                    path: path.to_string(),
                    error: Some(reason),
                })
            }
        };

        match tokio::fs::metadata(&resolved).await {
            Ok(meta) if meta.len() > MAX_FILE_BYTES => Ok(FileReadCallResult {
                success: false,
                content: String::new(),
                size: meta.len(),
                path: path.to_string(),
                error: Some(format!("file exceeds {MAX_FILE_BYTES} byte read ceiling")),
            }),
            Ok(_) => match tokio::fs::read_to_string(&resolved).await {
                Ok(content) => Ok(FileReadCallResult {
                    success: true,
                    size: content.len() as u64,
                    path: path.to_string(),
                    content,
                    error: None,
                }),
                Err(e) => Ok(FileReadCallResult {
                    success: false,
                    content: String::new(),
                    size: 0,
                    path: path.to_string(),
                    error: Some(format!("read failed: {e}")),
                }),
            },
            Err(e) => Ok(FileReadCallResult {
                success: false,
                content: String::new(),
                size: 0,
                path: path.to_string(),
                error: Some(format!("not found: {e}")),
            }),
        }
    }

    async fn write_file(
        &self,
        id: &SandboxId,
        path: &str,
        content: &str,
    ) -> Result<FileWriteCallResult, SandboxError> {
        let policy = self.path_policy_for(id)?;
        let resolved = match policy.resolve(path) {
            Ok(p) => p,
            Err(reason) => {
                return Ok(FileWriteCallResult {
                    success: false,
                    path: path.to_string(),
                    size: 0,
                    error: Some(reason),
                })
            }
        };

        if content.len() as u64 > MAX_FILE_BYTES {
            return Ok(FileWriteCallResult {
                success: false,
                path: path.to_string(),
                size: 0,
                error: Some(format!("content exceeds {MAX_FILE_BYTES} byte write ceiling")),
            });
        }

        if let Some(parent) = resolved.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return Ok(FileWriteCallResult {
                    success: false,
                    path: path.to_string(),
                    size: 0,
                    error: Some(format!("failed to create parent directories: {e}")),
                });
            }
        }

        match tokio::fs::write(&resolved, content).await {
            Ok(()) => Ok(FileWriteCallResult {
                success: true,
                path: path.to_string(),
                size: content.len() as u64,
                error: None,
            }),
            Err(e) => Ok(FileWriteCallResult {
                success: false,
                path: path.to_string(),
                size: 0,
                error: Some(format!("write failed: {e}")),
            }),
        }
    }

    async fn list_directory(&self, id: &SandboxId, path: &str) -> Result<FileListCallResult, SandboxError> {
        let policy = self.path_policy_for(id)?;
        let target = if path.is_empty() { "/work" } else { path };
        let resolved = match policy.resolve(target) {
            Ok(p) => p,
            Err(reason) => {
                return Ok(FileListCallResult {
                    success: false,
                    path: path.to_string(),
                    files: Vec::new(),
                    error: Some(reason),
                })
            }
        };

        let mut files = Vec::new();
        let mut entries = match tokio::fs::read_dir(&resolved).await {
            Ok(entries) => entries,
            Err(e) => {
                return Ok(FileListCallResult {
                    success: false,
                    path: path.to_string(),
                    files: Vec::new(),
                    error: Some(format!("list failed: {e}")),
                })
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let meta = match entry.metadata().await {
                Ok(m) => m,
                Err(_) => continue,
            };
            let modified_ms = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);
            files.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind: if meta.is_dir() { FileEntryKind::Directory } else { FileEntryKind::File },
                size: meta.len(),
                modified_ms,
            });
        }

        let root = self.work_dir_path(id)?;
        Ok(FileListCallResult {
            success: true,
            path: display_path(&root, &resolved),
            files,
            error: None,
        })
    }

    async fn execute_browser(
        &self,
        _id: &SandboxId,
        action: BrowserAction,
    ) -> Result<BrowserCallResult, SandboxError> {
        let url = action.url().to_string();
        Ok(match action {
            BrowserAction::Open { .. } | BrowserAction::Click { .. } | BrowserAction::FillForm { .. } => {
                BrowserCallResult {
                    success: true,
                    url: Some(url),
                    ..Default::default()
                }
            }
            BrowserAction::Read { .. } => BrowserCallResult {
                success: true,
                url: Some(url.clone()),
                title: Some(format!("reference page for {url}")),
                text: Some("reference sandbox has no live browser; this is placeholder page text".to_string()),
                ..Default::default()
            },
            BrowserAction::Screenshot { .. } => BrowserCallResult {
                success: true,
                url: Some(url),
                screenshot_base64: Some(String::new()),
                ..Default::default()
            },
            BrowserAction::ExtractTable { .. } => BrowserCallResult {
                success: true,
                url: Some(url),
                table: Some(vec![vec!["column".to_string()], vec!["value".to_string()]]),
                ..Default::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox_id() -> SandboxId {
        SandboxId::new("test-sandbox")
    }

    #[tokio::test]
    async fn create_then_get_returns_running_sandbox() {
        let mgr = ReferenceSandboxManager::new();
        let cancel = CancellationToken::new();
        let created = mgr.create(&sandbox_id(), &SandboxCreateConfig::default(), &cancel).await.unwrap();
        assert_eq!(created.status, SandboxStatus::Running);
        assert!(mgr.get(&sandbox_id()).await.is_some());
    }

    #[tokio::test]
    async fn destroy_is_idempotent() {
        let mgr = ReferenceSandboxManager::new();
        let cancel = CancellationToken::new();
        mgr.create(&sandbox_id(), &SandboxCreateConfig::default(), &cancel).await.unwrap();
        mgr.destroy(&sandbox_id()).await.unwrap();
        mgr.destroy(&sandbox_id()).await.unwrap();
        assert!(mgr.get(&sandbox_id()).await.is_none());
    }

    #[tokio::test]
    async fn create_destroy_create_succeeds() {
        let mgr = ReferenceSandboxManager::new();
        let cancel = CancellationToken::new();
        mgr.create(&sandbox_id(), &SandboxCreateConfig::default(), &cancel).await.unwrap();
        mgr.destroy(&sandbox_id()).await.unwrap();
        let recreated = mgr.create(&sandbox_id(), &SandboxCreateConfig::default(), &cancel).await.unwrap();
        assert_eq!(recreated.status, SandboxStatus::Running);
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let mgr = ReferenceSandboxManager::new();
        let cancel = CancellationToken::new();
        mgr.create(&sandbox_id(), &SandboxCreateConfig::default(), &cancel).await.unwrap();

        let write = mgr.write_file(&sandbox_id(), "hello.txt", "Hello").await.unwrap();
        assert!(write.success);

        let read = mgr.read_file(&sandbox_id(), "hello.txt").await.unwrap();
        assert!(read.success);
        assert_eq!(read.content, "Hello");
    }

    #[tokio::test]
    async fn second_write_overwrites_first() {
        let mgr = ReferenceSandboxManager::new();
        let cancel = CancellationToken::new();
        mgr.create(&sandbox_id(), &SandboxCreateConfig::default(), &cancel).await.unwrap();

        mgr.write_file(&sandbox_id(), "f.txt", "one").await.unwrap();
        mgr.write_file(&sandbox_id(), "f.txt", "two").await.unwrap();
        let read = mgr.read_file(&sandbox_id(), "f.txt").await.unwrap();
        assert_eq!(read.content, "two");
    }

    #[tokio::test]
    async fn blocked_command_never_spawns_and_fails() {
        let mgr = ReferenceSandboxManager::new();
        let cancel = CancellationToken::new();
        mgr.create(&sandbox_id(), &SandboxCreateConfig::default(), &cancel).await.unwrap();

        let result = mgr
            .execute_shell(
                &sandbox_id(),
                "sudo rm -rf /",
                ShellOptions { timeout: taskengine_types::DurationMs::from_secs(5), cwd: None },
            )
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("policy rejected"));
    }

    #[tokio::test]
    async fn ordinary_command_executes() {
        let mgr = ReferenceSandboxManager::new();
        let cancel = CancellationToken::new();
        mgr.create(&sandbox_id(), &SandboxCreateConfig::default(), &cancel).await.unwrap();

        let result = mgr
            .execute_shell(
                &sandbox_id(),
                "echo hi",
                ShellOptions { timeout: taskengine_types::DurationMs::from_secs(5), cwd: None },
            )
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "hi");
    }

    #[tokio::test]
    async fn path_traversal_read_is_denied() {
        let mgr = ReferenceSandboxManager::new();
        let cancel = CancellationToken::new();
        mgr.create(&sandbox_id(), &SandboxCreateConfig::default(), &cancel).await.unwrap();

        let result = mgr.read_file(&sandbox_id(), "../../etc/passwd").await.unwrap();
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn file_over_ceiling_is_rejected() {
        let mgr = ReferenceSandboxManager::new();
        let cancel = CancellationToken::new();
        mgr.create(&sandbox_id(), &SandboxCreateConfig::default(), &cancel).await.unwrap();

        let too_big = "a".repeat((MAX_FILE_BYTES + 1) as usize);
        let result = mgr.write_file(&sandbox_id(), "big.txt", &too_big).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn unknown_sandbox_returns_not_found() {
        let mgr = ReferenceSandboxManager::new();
        let err = mgr.read_file(&SandboxId::new("missing"), "x.txt").await.unwrap_err();
        assert!(matches!(err, SandboxError::NotFound(_)));
    }
}
