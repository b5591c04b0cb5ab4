#![deny(missing_docs)]
//! # taskengine-worker — bounded-concurrency queue consumer (C8)
//!
//! [`Worker::run`] pulls task IDs from a [`JobQueue`] and dispatches each
//! to a shared [`Orchestrator`], running up to
//! [`EngineConfig::worker_concurrency`] tasks at once. A task that fails
//! before the Orchestrator could record any outcome (an infrastructure
//! hiccup on the very first status transition) is retried up to three
//! times with exponential backoff; a task the Orchestrator itself carried
//! to a terminal status is never retried, and an externally cancelled
//! task short-circuits any attempt still pending.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;

use taskengine_orchestrator::Orchestrator;
use taskengine_store_memory::{JobQueue, TaskStore};
use taskengine_types::{EngineConfig, TaskId, TaskStatus};

const MAX_ATTEMPTS: u32 = 3;

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(200 * 2u64.pow(attempt.saturating_sub(1)))
}

/// Pulls jobs from a queue and runs them through a shared [`Orchestrator`]
/// with bounded concurrency.
pub struct Worker {
    queue: Arc<dyn JobQueue>,
    store: Arc<dyn TaskStore>,
    orchestrator: Arc<Orchestrator>,
    concurrency: usize,
    cancellations: Mutex<HashMap<TaskId, CancellationToken>>,
}

impl Worker {
    /// Construct a worker bound to the given queue, store, and
    /// orchestrator, reading `worker_concurrency` from `config`.
    pub fn new(
        queue: Arc<dyn JobQueue>,
        store: Arc<dyn TaskStore>,
        orchestrator: Arc<Orchestrator>,
        config: &EngineConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue,
            store,
            orchestrator,
            concurrency: config.worker_concurrency.max(1),
            cancellations: Mutex::new(HashMap::new()),
        })
    }

    /// Request cancellation of a task this worker is currently running or
    /// may yet pick up. A no-op if the task isn't tracked (not yet
    /// dequeued, or already finished).
    pub async fn cancel(&self, task_id: &TaskId) {
        if let Some(token) = self.cancellations.lock().await.get(task_id) {
            token.cancel();
        }
    }

    /// Run the dispatch loop until `shutdown` fires. Pulls one task at a
    /// time from the queue, spawning its processing once a concurrency
    /// slot is free; returns once `shutdown` fires and every in-flight job
    /// it spawned has settled.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::new();

        loop {
            let Some(task_id) = self.queue.dequeue(&shutdown).await else {
                break;
            };

            let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
            let worker = self.clone();
            let shutdown = shutdown.clone();
            handles.push(tokio::spawn(async move {
                worker.process(task_id, shutdown).await;
                drop(permit);
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
    }

    async fn process(&self, task_id: TaskId, shutdown: CancellationToken) {
        let token = shutdown.child_token();
        self.cancellations.lock().await.insert(task_id.clone(), token.clone());

        let mut attempt = 0;
        loop {
            attempt += 1;

            if self.task_is_cancelled(&task_id).await {
                tracing::info!(task = %task_id, "taskengine.worker.short_circuit_cancelled");
                break;
            }

            match self.orchestrator.run_task(&task_id, &token).await {
                Ok(()) => break,
                Err(e) => {
                    if self.task_reached_terminal_status(&task_id).await {
                        tracing::warn!(task = %task_id, error = %e, "taskengine.worker.task_failed");
                        break;
                    }
                    if attempt >= MAX_ATTEMPTS {
                        tracing::error!(task = %task_id, attempts = attempt, error = %e, "taskengine.worker.retries_exhausted");
                        let _ = self
                            .store
                            .set_error(&task_id, format!("worker retries exhausted: {e}"))
                            .await;
                        let _ = self.store.update_status(&task_id, None, TaskStatus::Failed, now_ms()).await;
                        break;
                    }
                    tracing::warn!(task = %task_id, attempt, error = %e, "taskengine.worker.retrying");
                    tokio::time::sleep(backoff(attempt)).await;
                    // `run_task` requires Queued as its starting status; this
                    // attempt may have advanced it to Running before failing
                    // non-terminally (e.g. the initial event-log append), so
                    // reset it before looping back in. Only this worker's own
                    // sequential loop owns `task_id` between dequeue and the
                    // final `break`, so there is no concurrent attempt to
                    // clobber.
                    let _ = self.store.update_status(&task_id, None, TaskStatus::Queued, now_ms()).await;
                }
            }
        }

        self.cancellations.lock().await.remove(&task_id);
    }

    async fn task_is_cancelled(&self, task_id: &TaskId) -> bool {
        matches!(self.store.get(task_id).await, Ok(Some(task)) if task.status == TaskStatus::Cancelled)
    }

    async fn task_reached_terminal_status(&self, task_id: &TaskId) -> bool {
        matches!(self.store.get(task_id).await, Ok(Some(task)) if task.status.is_terminal())
    }
}

fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}
