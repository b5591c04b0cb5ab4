#![deny(missing_docs)]
//! # taskengine-orchestrator — the planning/execution/critique loop (C7)
//!
//! [`Orchestrator::run_task`] is the single state machine that drives one
//! task from `running` to a terminal status: it creates the task's
//! sandbox, invokes the Planner once, executes the resulting plan step by
//! step, consults the Critic after each step and splices in any
//! corrective steps it proposes, and finalizes the task's status and
//! event log. Once the sandbox is successfully created, it is destroyed
//! exactly once on every exit path that follows, including cancellation
//! and planner failure. A cancellation or `SandboxError` observed at or
//! before sandbox creation itself never produces a `sandbox_created` (or
//! paired `sandbox_destroyed`) event, since no sandbox exists to destroy.
//!
//! The Orchestrator is the sole writer of a task's status and event log;
//! the Worker Loop only delegates to it and reacts to its `Result`.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use taskengine_critic::Critic;
use taskengine_planner::Planner;
use taskengine_registry::{ToolContext, ToolRegistry};
use taskengine_sandbox::{SandboxCreateConfig, SandboxManager};
use taskengine_store_memory::TaskStore;
use taskengine_types::{
    EngineConfig, Event, EventKind, OrchestratorError, SandboxId, Step, StepStatus, Task, TaskId,
    TaskStatus,
};

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

fn store_err(e: taskengine_store_memory::StoreError) -> OrchestratorError {
    OrchestratorError::Other(Box::new(e))
}

fn not_found(task_id: &TaskId) -> OrchestratorError {
    OrchestratorError::Other(Box::new(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("task not found: {task_id}"),
    )))
}

/// Drives one task through the planning/execution/critique loop.
///
/// Holds everything the loop needs: the tool registry, the sandbox
/// manager backing it, a bound Planner and (optionally disabled) Critic,
/// the durable task store, and the engine's configuration.
pub struct Orchestrator {
    registry: Arc<ToolRegistry>,
    sandbox_manager: Arc<dyn SandboxManager>,
    planner: Planner,
    critic: Option<Critic>,
    store: Arc<dyn TaskStore>,
    config: EngineConfig,
}

impl Orchestrator {
    /// Construct an orchestrator from its collaborators. Pass `critic:
    /// None` to run with the Critic disabled entirely, per
    /// `EngineConfig::critic_enabled`.
    pub fn new(
        registry: Arc<ToolRegistry>,
        sandbox_manager: Arc<dyn SandboxManager>,
        planner: Planner,
        critic: Option<Critic>,
        store: Arc<dyn TaskStore>,
        config: EngineConfig,
    ) -> Self {
        Self { registry, sandbox_manager, planner, critic, store, config }
    }

    /// Run `task_id` to completion. Always transitions the task out of
    /// `running` into a terminal status. Destroys the task's sandbox
    /// before returning, but only if `drive` got far enough to create one
    /// — a cancellation or `SandboxError` at create time leaves nothing to
    /// tear down.
    pub async fn run_task(&self, task_id: &TaskId, cancel: &CancellationToken) -> Result<(), OrchestratorError> {
        let sandbox_id = SandboxId::new(task_id.as_str());

        self.store
            .update_status(task_id, Some(TaskStatus::Queued), TaskStatus::Running, now_ms())
            .await
            .map_err(store_err)?;
        self.append_event(task_id, EventKind::TaskStarted, Value::Null).await?;

        let mut sandbox_created = false;
        let drive_result = self.drive(task_id, &sandbox_id, cancel, &mut sandbox_created).await;

        if sandbox_created {
            if let Err(e) = self.sandbox_manager.destroy(&sandbox_id).await {
                tracing::warn!(error = %e, sandbox = %sandbox_id, "taskengine.orchestrator.destroy_failed");
            }
            let _ = self
                .append_event(task_id, EventKind::SandboxDestroyed, json!({"sandboxId": sandbox_id.as_str()}))
                .await;
        }

        // The task's status is flipped to its terminal value only after the
        // sandbox-teardown event above has been appended: the event log
        // forbids appends once a task is terminal, so marking it terminal
        // any earlier would silently drop `sandbox_destroyed`.
        match drive_result {
            Ok(status) => {
                self.store.update_status(task_id, None, status, now_ms()).await.map_err(store_err)?;
                Ok(())
            }
            Err(e) => {
                let _ = self
                    .append_event(task_id, EventKind::OrchestrationFailed, json!({"error": e.to_string()}))
                    .await;
                let _ = self.store.set_error(task_id, e.to_string()).await;
                let terminal = if matches!(e, OrchestratorError::Cancelled) {
                    TaskStatus::Cancelled
                } else {
                    TaskStatus::Failed
                };
                let _ = self.store.update_status(task_id, None, terminal, now_ms()).await;
                tracing::warn!(task = %task_id, error = %e, "taskengine.orchestrator.run_failed");
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        task_id: &TaskId,
        sandbox_id: &SandboxId,
        cancel: &CancellationToken,
        sandbox_created: &mut bool,
    ) -> Result<TaskStatus, OrchestratorError> {
        if cancel.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }

        let task = self.load_task(task_id).await?;

        let sandbox_config = SandboxCreateConfig::from_engine_config(&self.config);
        let sandbox = self.sandbox_manager.create(sandbox_id, &sandbox_config, cancel).await?;
        // The sandbox now exists and must be torn down by the caller on
        // every remaining exit path, success or failure alike.
        *sandbox_created = true;
        self.append_event(task_id, EventKind::SandboxCreated, json!({"ports": sandbox.ports})).await?;

        self.append_event(task_id, EventKind::PlanningStarted, Value::Null).await?;
        let plan = self.planner.plan(&task.goal, &task.context, &self.registry, cancel).await?;
        self.store.set_plan(task_id, plan.clone()).await.map_err(store_err)?;
        self.append_event(
            task_id,
            EventKind::PlanGenerated,
            json!({"steps": plan.iter().map(step_summary).collect::<Vec<_>>()}),
        )
        .await?;

        self.append_event(task_id, EventKind::ExecutionStarted, Value::Null).await?;
        self.run_steps(task_id, sandbox_id, &task, plan, cancel).await
    }

    async fn run_steps(
        &self,
        task_id: &TaskId,
        sandbox_id: &SandboxId,
        task: &Task,
        mut plan: Vec<Step>,
        cancel: &CancellationToken,
    ) -> Result<TaskStatus, OrchestratorError> {
        let ctx = ToolContext::new(sandbox_id.clone(), task_id.clone(), self.config.step_timeout);
        let mut history: Vec<Step> = Vec::new();
        let mut index = 0;
        let mut aborted_early = false;

        while index < plan.len() {
            if cancel.is_cancelled() {
                return Err(OrchestratorError::Cancelled);
            }

            let pending = plan[index].clone();
            self.append_event(task_id, EventKind::StepStarted, json!({"stepId": pending.id.as_str()})).await?;

            let executed = taskengine_executor::execute_step(pending, &self.registry, &ctx).await;
            plan[index] = executed.clone();
            self.store.update_step(task_id, executed.clone()).await.map_err(store_err)?;

            if let Some(result) = &executed.result {
                let truncated = taskengine_tools::truncate_with_marker(&result.output, 500);
                self.append_event(
                    task_id,
                    EventKind::StepCompleted,
                    json!({"stepId": executed.id.as_str(), "success": result.success, "output": truncated}),
                )
                .await?;
                for artifact in &result.artifacts {
                    let _ = self.store.append_artifact(task_id, artifact.clone()).await;
                }
            }

            history.push(executed.clone());

            if let Some(critic) = &self.critic {
                if executed.generation < self.config.max_correction_generation {
                    let next_generation = executed.generation + 1;
                    let (evaluation, corrections) = critic
                        .review(&task.goal, &plan, &history, &executed, &self.registry, next_generation, cancel)
                        .await;
                    self.append_event(
                        task_id,
                        EventKind::CriticEvaluation,
                        json!({
                            "stepId": executed.id.as_str(),
                            "onTrack": evaluation.on_track,
                            "confidence": evaluation.confidence,
                            "issues": evaluation.issues,
                        }),
                    )
                    .await?;

                    if !corrections.is_empty() && evaluation.warrants_correction(self.config.critic_confidence_threshold) {
                        let inserted = corrections.len();
                        for (offset, corrective) in corrections.into_iter().enumerate() {
                            plan.insert(index + 1 + offset, corrective);
                        }
                        self.store.set_plan(task_id, plan.clone()).await.map_err(store_err)?;
                        self.append_event(
                            task_id,
                            EventKind::CorrectionApplied,
                            json!({"afterStep": executed.id.as_str(), "stepsInserted": inserted}),
                        )
                        .await?;
                    }
                }
            }

            if executed.status == StepStatus::Failed && executed.required {
                self.append_event(task_id, EventKind::ExecutionStopped, json!({"stepId": executed.id.as_str()})).await?;
                aborted_early = true;
                break;
            }

            index += 1;
        }

        self.store.set_plan(task_id, plan.clone()).await.map_err(store_err)?;
        self.finalize(task_id, &plan, aborted_early).await
    }

    async fn finalize(&self, task_id: &TaskId, plan: &[Step], aborted_early: bool) -> Result<TaskStatus, OrchestratorError> {
        let all_completed = plan.iter().all(|s| s.status == StepStatus::Completed);

        if all_completed {
            self.append_event(task_id, EventKind::TaskSucceeded, Value::Null).await?;
            Ok(TaskStatus::Succeeded)
        } else {
            self.append_event(task_id, EventKind::TaskCompletedWithFailures, Value::Null).await?;
            Ok(if aborted_early { TaskStatus::Failed } else { TaskStatus::Succeeded })
        }
    }

    async fn append_event(&self, task_id: &TaskId, kind: EventKind, data: Value) -> Result<(), OrchestratorError> {
        self.store.append_event(task_id, Event::new(kind, now_ms(), data)).await.map_err(store_err)
    }

    async fn load_task(&self, task_id: &TaskId) -> Result<Task, OrchestratorError> {
        self.store.get(task_id).await.map_err(store_err)?.ok_or_else(|| not_found(task_id))
    }
}

fn step_summary(step: &Step) -> Value {
    json!({"id": step.id.as_str(), "description": step.description})
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value as Json;
    use taskengine_llm::MockLlmProvider;
    use taskengine_registry::ToolHandler;
    use taskengine_sandbox_ref::ReferenceSandboxManager;
    use taskengine_store_memory::MemoryTaskStore;
    use taskengine_types::{StepResult, TaskId};

    /// Cancels the shared token the instant it runs, so a test can observe
    /// the Orchestrator's loop noticing cancellation between two steps
    /// rather than only before the first one.
    struct CancelAfterTool {
        cancel: CancellationToken,
    }

    #[async_trait]
    impl ToolHandler for CancelAfterTool {
        fn description(&self) -> &str {
            "test-only: cancels the run's token and reports success"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn invoke(&self, _arguments: Value, _ctx: &ToolContext) -> StepResult {
            self.cancel.cancel();
            StepResult::success("cancelled the run")
        }
    }

    fn harness(plan_response: &str, critic_response: Option<&str>) -> (Orchestrator, Arc<MemoryTaskStore>) {
        let sandbox = Arc::new(ReferenceSandboxManager::new());
        let mut registry = ToolRegistry::new();
        taskengine_tools::register_all(&mut registry, sandbox.clone());
        let registry = Arc::new(registry);

        let planner = Planner::new(Arc::new(MockLlmProvider::returning(plan_response)), "planner");
        let critic = critic_response.map(|r| Critic::new(Arc::new(MockLlmProvider::returning(r)), "critic"));
        let store = Arc::new(MemoryTaskStore::new());

        let orchestrator = Orchestrator::new(registry, sandbox, planner, critic, store.clone(), EngineConfig::default());
        (orchestrator, store)
    }

    async fn seed(store: &MemoryTaskStore, id: &str, goal: &str) -> TaskId {
        let task_id = TaskId::new(id);
        store.create(Task::new(task_id.clone(), goal, Json::Null, now_ms())).await.unwrap();
        task_id
    }

    #[tokio::test]
    async fn hello_file_goal_succeeds() {
        let (orchestrator, store) = harness(
            r#"[{"id":"s1","description":"write hello","tool":"file_write","arguments":{"path":"hello.txt","content":"Hello"}}]"#,
            None,
        );
        let task_id = seed(&store, "t1", "create hello.txt").await;

        orchestrator.run_task(&task_id, &CancellationToken::new()).await.unwrap();

        let task = store.get(&task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert!(task.events.iter().any(|e| e.kind == EventKind::TaskSucceeded));
        assert!(task.events.iter().any(|e| e.kind == EventKind::SandboxDestroyed));
    }

    #[tokio::test]
    async fn required_step_failure_aborts_and_fails_task() {
        let (orchestrator, store) = harness(
            r#"[{"id":"s1","description":"bad read","tool":"file_read","arguments":{"path":"missing.txt"}},
                {"id":"s2","description":"never runs","tool":"file_read","arguments":{"path":"also-missing.txt"}}]"#,
            None,
        );
        let task_id = seed(&store, "t1", "read a missing file").await;

        let err = orchestrator.run_task(&task_id, &CancellationToken::new()).await;
        assert!(err.is_ok(), "a failed required step is recorded, not raised");

        let task = store.get(&task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.events.iter().any(|e| e.kind == EventKind::ExecutionStopped));
        assert!(task.events.iter().any(|e| e.kind == EventKind::TaskCompletedWithFailures));
        let plan = task.plan.unwrap();
        assert_eq!(plan[1].status, StepStatus::Pending);
    }

    #[tokio::test]
    async fn non_required_step_failure_still_succeeds_overall() {
        let (orchestrator, store) = harness(
            r#"[{"id":"s1","description":"bad read","tool":"file_read","arguments":{"path":"missing.txt"},"required":false}]"#,
            None,
        );
        let task_id = seed(&store, "t1", "best-effort read").await;

        orchestrator.run_task(&task_id, &CancellationToken::new()).await.unwrap();

        let task = store.get(&task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert!(task.events.iter().any(|e| e.kind == EventKind::TaskCompletedWithFailures));
    }

    #[tokio::test]
    async fn unreachable_planner_fails_the_task() {
        let sandbox = Arc::new(ReferenceSandboxManager::new());
        let mut registry = ToolRegistry::new();
        taskengine_tools::register_all(&mut registry, sandbox.clone());
        let planner = Planner::new(Arc::new(MockLlmProvider::unreachable("connection refused")), "planner");
        let store = Arc::new(MemoryTaskStore::new());
        let orchestrator = Orchestrator::new(Arc::new(registry), sandbox, planner, None, store.clone(), EngineConfig::default());

        let task_id = seed(&store, "t1", "goal").await;
        let err = orchestrator.run_task(&task_id, &CancellationToken::new()).await;
        assert!(err.is_err());

        let task = store.get(&task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.unwrap().contains("planner"));
        assert!(task.events.iter().any(|e| e.kind == EventKind::OrchestrationFailed));
        assert!(task.events.iter().any(|e| e.kind == EventKind::SandboxDestroyed));
    }

    #[tokio::test]
    async fn cancellation_before_sandbox_create_leaves_no_create_destroy_pair() {
        let (orchestrator, store) = harness(r#"[]"#, None);
        let task_id = seed(&store, "t1", "goal").await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = orchestrator.run_task(&task_id, &cancel).await;
        assert!(matches!(err, Err(OrchestratorError::Cancelled)));

        let task = store.get(&task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
        assert!(!task.events.iter().any(|e| e.kind == EventKind::TaskSucceeded));
        // Cancellation landed before `create()` ever ran: there is no
        // sandbox to tear down, so neither half of the pair is recorded.
        assert!(!task.events.iter().any(|e| e.kind == EventKind::SandboxCreated));
        assert!(!task.events.iter().any(|e| e.kind == EventKind::SandboxDestroyed));
        assert_eq!(task.events.last().unwrap().kind, EventKind::OrchestrationFailed);
    }

    #[tokio::test]
    async fn cancellation_mid_loop_still_destroys_the_created_sandbox() {
        let sandbox = Arc::new(ReferenceSandboxManager::new());
        let mut registry = ToolRegistry::new();
        taskengine_tools::register_all(&mut registry, sandbox.clone());

        let cancel = CancellationToken::new();
        registry.register("cancel_after", Arc::new(CancelAfterTool { cancel: cancel.clone() }));
        let registry = Arc::new(registry);

        let planner = Planner::new(
            Arc::new(MockLlmProvider::returning(
                r#"[{"id":"s1","description":"first step","tool":"cancel_after","arguments":{}},
                    {"id":"s2","description":"second step, never runs","tool":"file_write","arguments":{"path":"b.txt","content":"b"}}]"#,
            )),
            "planner",
        );
        let store = Arc::new(MemoryTaskStore::new());
        let orchestrator = Orchestrator::new(registry, sandbox, planner, None, store.clone(), EngineConfig::default());
        let task_id = seed(&store, "t1", "cancel between steps").await;

        let err = orchestrator.run_task(&task_id, &cancel).await;
        assert!(matches!(err, Err(OrchestratorError::Cancelled)));

        let task = store.get(&task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
        // Step 1 ran to completion (step_started/step_completed observed),
        // the cancellation landed before step 2's step_started, and the
        // sandbox created for this run is still torn down.
        assert!(task.events.iter().any(|e| e.kind == EventKind::StepCompleted));
        assert_eq!(task.events.iter().filter(|e| e.kind == EventKind::StepStarted).count(), 1);
        assert!(task.events.iter().any(|e| e.kind == EventKind::SandboxCreated));
        assert_eq!(task.events.last().unwrap().kind, EventKind::SandboxDestroyed);
        let plan = task.plan.unwrap();
        assert_eq!(plan[1].status, StepStatus::Pending);
    }

    #[tokio::test]
    async fn critic_correction_is_spliced_and_recorded() {
        let (orchestrator, store) = harness(
            r#"[{"id":"s1","description":"bad read","tool":"file_read","arguments":{"path":"missing.txt"},"required":false}]"#,
            Some(
                r#"{"onTrack":false,"issues":["missing file"],"suggestions":["write it first"],"confidence":0.9,
                    "correctiveSteps":[{"id":"fix1","description":"write the file","tool":"file_write","arguments":{"path":"missing.txt","content":"now here"}}]}"#,
            ),
        );
        let task_id = seed(&store, "t1", "recover from a missing file").await;

        orchestrator.run_task(&task_id, &CancellationToken::new()).await.unwrap();

        let task = store.get(&task_id).await.unwrap().unwrap();
        assert!(task.events.iter().any(|e| e.kind == EventKind::CorrectionApplied));
        let plan = task.plan.unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].id.as_str(), "corr-g1-fix1");
        assert_eq!(plan[1].status, StepStatus::Completed);
    }
}
