//! Production [`SandboxManager`] binding to the Docker Engine API.
//!
//! Container lifecycle (create/start/stop/remove, port-map inspection) goes
//! through `bollard`; the shell/file/browser façade calls go through a
//! conventional `reqwest` client against the host-side ports Docker
//! assigned. Both bindings sit behind [`SandboxManager`] so a test double
//! can stand in without touching a daemon.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bollard::container::{
    Config as ContainerConfig, CreateContainerOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, PortBinding};
use bollard::Docker;
use futures_util::TryStreamExt;
use serde_json::json;
use taskengine_types::{PortMap, Sandbox, SandboxError, SandboxId, SandboxStatus};
use tokio_util::sync::CancellationToken;

use crate::config::SandboxCreateConfig;
use crate::facade::{
    BrowserAction, BrowserCallResult, FileListCallResult, FileReadCallResult,
    FileWriteCallResult, ShellCallResult, ShellOptions,
};
use crate::health::probe_until_healthy;
use crate::manager::SandboxManager;

const SHELL_PORT: u16 = 3001;
const BROWSER_PORT: u16 = 3002;
const FILE_PORT: u16 = 3003;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn container_name(id: &SandboxId) -> String {
    format!("taskengine-{}", id.as_str())
}

/// Docker-backed [`SandboxManager`]. Holds a weak (non-owning) lookup table
/// of sandboxes it created; the Orchestrator that called `create` is the
/// exclusive logical owner.
pub struct DockerSandboxManager {
    docker: Docker,
    http: reqwest::Client,
    sandboxes: Mutex<HashMap<SandboxId, SandboxRecord>>,
}

struct SandboxRecord {
    sandbox: Sandbox,
    container_id: String,
    stop_remove_budget_ms: u64,
}

impl DockerSandboxManager {
    /// Connect to the local Docker daemon using its default socket.
    pub fn connect() -> Result<Self, SandboxError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| SandboxError::CreateFailed(format!("docker connect failed: {e}")))?;
        Ok(Self {
            docker,
            http: reqwest::Client::new(),
            sandboxes: Mutex::new(HashMap::new()),
        })
    }

    async fn ensure_image(&self, image: &str) -> Result<(), SandboxError> {
        if self.docker.inspect_image(image).await.is_ok() {
            return Ok(());
        }
        tracing::info!(image, "taskengine.sandbox.pulling_image");
        let options = CreateImageOptions {
            from_image: image,
            ..Default::default()
        };
        self.docker
            .create_image(Some(options), None, None)
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| SandboxError::CreateFailed(format!("image pull failed: {e}")))?;
        Ok(())
    }

    async fn reap_stale(&self, name: &str) {
        let remove_opts = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        if let Err(e) = self.docker.remove_container(name, Some(remove_opts)).await {
            tracing::debug!(name, error = %e, "taskengine.sandbox.reap_stale_noop");
        }
    }

    fn host_config(&self, config: &SandboxCreateConfig) -> HostConfig {
        let mut tmpfs = HashMap::new();
        tmpfs.insert("/tmp".to_string(), format!("size={}", config.tmp_tmpfs_bytes));
        tmpfs.insert("/work".to_string(), format!("size={}", config.work_tmpfs_bytes));

        let mut port_bindings = HashMap::new();
        for port in self.service_ports(config) {
            port_bindings.insert(
                format!("{port}/tcp"),
                Some(vec![PortBinding {
                    host_ip: Some("127.0.0.1".to_string()),
                    host_port: None,
                }]),
            );
        }

        HostConfig {
            cpu_quota: Some((config.cpu_limit * 100_000.0) as i64),
            cpu_period: Some(100_000),
            memory: Some(config.memory_limit_bytes as i64),
            cap_drop: Some(vec!["ALL".to_string()]),
            security_opt: Some(vec!["no-new-privileges".to_string()]),
            readonly_rootfs: Some(true),
            tmpfs: Some(tmpfs),
            port_bindings: Some(port_bindings),
            publish_all_ports: Some(false),
            ..Default::default()
        }
    }

    fn service_ports(&self, config: &SandboxCreateConfig) -> Vec<u16> {
        if config.enable_browser {
            vec![SHELL_PORT, FILE_PORT, BROWSER_PORT]
        } else {
            vec![SHELL_PORT, FILE_PORT]
        }
    }

    fn port(&self, id: &SandboxId, service_port: u16) -> Result<u16, SandboxError> {
        let guard = self.sandboxes.lock().expect("sandbox lock poisoned");
        let record = guard
            .get(id)
            .ok_or_else(|| SandboxError::NotFound(id.to_string()))?;
        record
            .sandbox
            .ports
            .get(&service_port.to_string())
            .copied()
            .ok_or_else(|| SandboxError::CallFailed(format!("no host port mapped for {service_port}")))
    }

    fn transport_timeout(requested: Duration) -> Duration {
        requested + Duration::from_secs(5)
    }
}

#[async_trait]
impl SandboxManager for DockerSandboxManager {
    async fn create(
        &self,
        id: &SandboxId,
        config: &SandboxCreateConfig,
        cancel: &CancellationToken,
    ) -> Result<Sandbox, SandboxError> {
        let name = container_name(id);
        self.ensure_image(&config.image).await?;
        self.reap_stale(&name).await;

        let exposed_ports: HashMap<String, HashMap<(), ()>> = self
            .service_ports(config)
            .into_iter()
            .map(|p| (format!("{p}/tcp"), HashMap::new()))
            .collect();

        let container_config = ContainerConfig {
            image: Some(config.image.clone()),
            user: Some("nobody".to_string()),
            exposed_ports: Some(exposed_ports),
            host_config: Some(self.host_config(config)),
            ..Default::default()
        };

        let create_opts = CreateContainerOptions {
            name: name.clone(),
            platform: None,
        };

        let created = self
            .docker
            .create_container(Some(create_opts), container_config)
            .await
            .map_err(|e| SandboxError::CreateFailed(format!("container create failed: {e}")))?;

        if let Err(e) = self
            .docker
            .start_container(&created.id, None::<StartContainerOptions<String>>)
            .await
        {
            self.reap_stale(&name).await;
            return Err(SandboxError::CreateFailed(format!("container start failed: {e}")));
        }

        let ports = self.inspect_ports(&created.id).await.map_err(|e| {
            SandboxError::CreateFailed(format!("port inspection failed: {e}"))
        })?;

        let shell_port = *ports.get(&SHELL_PORT.to_string()).ok_or_else(|| {
            SandboxError::CreateFailed("shell service port was not bound".to_string())
        })?;

        let health_url = format!("http://127.0.0.1:{shell_port}/health");
        let http = self.http.clone();
        let probe_result = probe_until_healthy(
            config.health_probe_attempts,
            config.health_probe_interval.to_std(),
            cancel,
            || {
                let http = http.clone();
                let url = health_url.clone();
                async move { http.get(&url).send().await.map(|r| r.status().is_success()).unwrap_or(false) }
            },
        )
        .await;

        if let Err(e) = probe_result {
            self.reap_stale(&name).await;
            return Err(e);
        }

        let created_at_ms = now_ms();
        let mut sandbox = Sandbox::creating(id.clone(), created_at_ms, created_at_ms + config.destroy_deadline.as_millis());
        sandbox.container_id = Some(created.id.clone());
        sandbox.status = SandboxStatus::Running;
        sandbox.ports = ports;

        self.sandboxes.lock().expect("sandbox lock poisoned").insert(
            id.clone(),
            SandboxRecord {
                sandbox: sandbox.clone(),
                container_id: created.id,
                stop_remove_budget_ms: config.stop_remove_budget.as_millis(),
            },
        );

        tracing::info!(sandbox = %id, "taskengine.sandbox.created");
        Ok(sandbox)
    }

    async fn get(&self, id: &SandboxId) -> Option<Sandbox> {
        self.sandboxes
            .lock()
            .expect("sandbox lock poisoned")
            .get(id)
            .map(|r| r.sandbox.clone())
    }

    async fn destroy(&self, id: &SandboxId) -> Result<(), SandboxError> {
        let record = self.sandboxes.lock().expect("sandbox lock poisoned").remove(id);
        let Some(record) = record else {
            tracing::warn!(sandbox = %id, "taskengine.sandbox.destroy_unknown");
            return Ok(());
        };

        let stop_opts = StopContainerOptions {
            t: (record.stop_remove_budget_ms / 1000).max(1) as i64,
        };
        if let Err(e) = self.docker.stop_container(&record.container_id, Some(stop_opts)).await {
            tracing::warn!(sandbox = %id, error = %e, "taskengine.sandbox.stop_failed");
        }

        let remove_opts = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        if let Err(e) = self.docker.remove_container(&record.container_id, Some(remove_opts)).await {
            tracing::warn!(sandbox = %id, error = %e, "taskengine.sandbox.remove_failed");
            return Err(SandboxError::DestroyFailed(e.to_string()));
        }

        tracing::info!(sandbox = %id, "taskengine.sandbox.destroyed");
        Ok(())
    }

    async fn execute_shell(
        &self,
        id: &SandboxId,
        command: &str,
        opts: ShellOptions,
    ) -> Result<ShellCallResult, SandboxError> {
        let port = self.port(id, SHELL_PORT)?;
        let url = format!("http://127.0.0.1:{port}/execute");
        let body = json!({
            "command": command,
            "timeout": opts.timeout.as_millis(),
            "cwd": opts.cwd,
        });
        let response = self
            .http
            .post(&url)
            .timeout(Self::transport_timeout(opts.timeout.to_std()))
            .json(&body)
            .send()
            .await;
        Ok(match response {
            Ok(r) if r.status().is_success() => r.json::<ShellCallResult>().await.unwrap_or_else(|e| ShellCallResult {
                success: false,
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                error: Some(format!("response parse failed: {e}")),
            }),
            Ok(r) => ShellCallResult {
                success: false,
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                error: Some(format!("shell service returned {}", r.status())),
            },
            Err(e) => ShellCallResult {
                success: false,
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                error: Some(format!("transport error: {e}")),
            },
        })
    }

    async fn read_file(&self, id: &SandboxId, path: &str) -> Result<FileReadCallResult, SandboxError> {
        let port = self.port(id, FILE_PORT)?;
        let url = format!("http://127.0.0.1:{port}/read");
        let response = self.http.get(&url).query(&[("path", path)]).send().await;
        Ok(match response {
            Ok(r) if r.status().is_success() => r.json::<FileReadCallResult>().await.unwrap_or_else(|e| FileReadCallResult {
                success: false,
                content: String::new(),
                size: 0,
                path: path.to_string(),
                error: Some(format!("response parse failed: {e}")),
            }),
            Ok(r) => FileReadCallResult {
                success: false,
                content: String::new(),
                size: 0,
                path: path.to_string(),
                error: Some(format!("file service returned {}", r.status())),
            },
            Err(e) => FileReadCallResult {
                success: false,
                content: String::new(),
                size: 0,
                path: path.to_string(),
                error: Some(format!("transport error: {e}")),
            },
        })
    }

    async fn write_file(
        &self,
        id: &SandboxId,
        path: &str,
        content: &str,
    ) -> Result<FileWriteCallResult, SandboxError> {
        let port = self.port(id, FILE_PORT)?;
        let url = format!("http://127.0.0.1:{port}/write");
        let body = json!({"path": path, "content": content});
        let response = self.http.post(&url).json(&body).send().await;
        Ok(match response {
            Ok(r) if r.status().is_success() => {
                r.json::<FileWriteCallResult>().await.unwrap_or_else(|e| FileWriteCallResult {
                    success: false,
                    path: path.to_string(),
                    size: 0,
                    error: Some(format!("response parse failed: {e}")),
                })
            }
            Ok(r) => FileWriteCallResult {
                success: false,
                path: path.to_string(),
                size: 0,
                error: Some(format!("file service returned {}", r.status())),
            },
            Err(e) => FileWriteCallResult {
                success: false,
                path: path.to_string(),
                size: 0,
                error: Some(format!("transport error: {e}")),
            },
        })
    }

    async fn list_directory(&self, id: &SandboxId, path: &str) -> Result<FileListCallResult, SandboxError> {
        let port = self.port(id, FILE_PORT)?;
        let url = format!("http://127.0.0.1:{port}/list");
        let response = self.http.get(&url).query(&[("path", path)]).send().await;
        Ok(match response {
            Ok(r) if r.status().is_success() => {
                r.json::<FileListCallResult>().await.unwrap_or_else(|e| FileListCallResult {
                    success: false,
                    path: path.to_string(),
                    files: Vec::new(),
                    error: Some(format!("response parse failed: {e}")),
                })
            }
            Ok(r) => FileListCallResult {
                success: false,
                path: path.to_string(),
                files: Vec::new(),
                error: Some(format!("file service returned {}", r.status())),
            },
            Err(e) => FileListCallResult {
                success: false,
                path: path.to_string(),
                files: Vec::new(),
                error: Some(format!("transport error: {e}")),
            },
        })
    }

    async fn execute_browser(
        &self,
        id: &SandboxId,
        action: BrowserAction,
    ) -> Result<BrowserCallResult, SandboxError> {
        let port = self.port(id, BROWSER_PORT)?;
        let url = format!("http://127.0.0.1:{port}/execute");
        let (selector, instructions) = match &action {
            BrowserAction::ExtractTable { selector, .. } | BrowserAction::Click { selector, .. } => {
                (Some(selector.clone()), None)
            }
            BrowserAction::FillForm { instructions, .. } => (None, Some(instructions.clone())),
            _ => (None, None),
        };
        let body = json!({
            "action": action.tag(),
            "url": action.url(),
            "selector": selector,
            "instructions": instructions,
            "timeout": action.timeout().as_millis(),
        });
        let response = self
            .http
            .post(&url)
            .timeout(Self::transport_timeout(action.timeout().to_std()))
            .json(&body)
            .send()
            .await;
        Ok(match response {
            Ok(r) if r.status().is_success() => {
                r.json::<BrowserCallResult>().await.unwrap_or(BrowserCallResult {
                    success: false,
                    error: Some("response parse failed".to_string()),
                    ..Default::default()
                })
            }
            Ok(r) => BrowserCallResult {
                success: false,
                error: Some(format!("browser service returned {}", r.status())),
                ..Default::default()
            },
            Err(e) => BrowserCallResult {
                success: false,
                error: Some(format!("transport error: {e}")),
                ..Default::default()
            },
        })
    }
}

impl DockerSandboxManager {
    async fn inspect_ports(&self, container_id: &str) -> Result<PortMap, bollard::errors::Error> {
        let details = self.docker.inspect_container(container_id, None).await?;
        let mut map = PortMap::new();
        if let Some(network_settings) = details.network_settings {
            if let Some(ports) = network_settings.ports {
                for (container_port, bindings) in ports {
                    let Some(bindings) = bindings else { continue };
                    let Some(binding) = bindings.into_iter().next() else {
                        continue;
                    };
                    let Some(host_port) = binding.host_port else { continue };
                    let Ok(host_port) = host_port.parse::<u16>() else {
                        continue;
                    };
                    let logical = container_port.split('/').next().unwrap_or(&container_port);
                    map.insert(logical.to_string(), host_port);
                }
            }
        }
        Ok(map)
    }
}
