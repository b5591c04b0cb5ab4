//! In-memory [`TaskStore`], backed by a `HashMap` behind a `RwLock` —
//! the same posture the corpus uses for its own in-memory state backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use taskengine_types::{Artifact, Event, Step, Task, TaskId, TaskStatus};

use crate::error::StoreError;
use crate::store::TaskStore;

/// In-memory task store. Suitable for tests and single-process
/// deployments; carries no persistence across restarts, matching the
/// Non-goals around resumable plans across worker restarts.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl MemoryTaskStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create(&self, task: Task) -> Result<(), StoreError> {
        self.tasks.write().await.insert(task.id.clone(), task);
        Ok(())
    }

    async fn get(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(id).cloned())
    }

    async fn list(&self, status: Option<TaskStatus>, limit: usize, offset: usize) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        let mut matching: Vec<Task> = tasks
            .values()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect();
        matching.sort_by_key(|t| t.created_at_ms);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn update_status(&self, id: &TaskId, expected: Option<TaskStatus>, new: TaskStatus, now_ms: u64) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(expected) = expected {
            if task.status != expected {
                return Err(StoreError::CasFailed {
                    task: id.to_string(),
                    expected: Some(expected),
                    found: task.status,
                });
            }
        }

        if new == TaskStatus::Running && task.started_at_ms.is_none() {
            task.started_at_ms = Some(now_ms);
        }
        if new.is_terminal() {
            task.completed_at_ms = Some(now_ms);
        }
        task.status = new;
        Ok(())
    }

    async fn set_error(&self, id: &TaskId, error: String) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        task.error = Some(error);
        Ok(())
    }

    async fn set_plan(&self, id: &TaskId, plan: Vec<Step>) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        task.plan = Some(plan);
        Ok(())
    }

    async fn update_step(&self, id: &TaskId, step: Step) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let plan = task.plan.as_mut().ok_or_else(|| StoreError::NotFound(format!("task {id} has no plan yet")))?;
        match plan.iter_mut().find(|s| s.id == step.id) {
            Some(existing) => *existing = step,
            None => plan.push(step),
        }
        Ok(())
    }

    async fn append_event(&self, id: &TaskId, event: Event) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if task.status.is_terminal() {
            return Err(StoreError::TerminalAppendRejected(id.to_string()));
        }
        task.push_event(event);
        Ok(())
    }

    async fn append_artifact(&self, id: &TaskId, artifact: Artifact) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        task.artifacts.push(artifact);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use taskengine_types::{EventKind, StepId};

    fn fresh_task(id: &str) -> Task {
        Task::new(TaskId::new(id), "do a thing", Value::Null, 0)
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = MemoryTaskStore::new();
        let task = fresh_task("t1");
        store.create(task.clone()).await.unwrap();
        let fetched = store.get(&TaskId::new("t1")).await.unwrap().unwrap();
        assert_eq!(fetched.goal, task.goal);
    }

    #[tokio::test]
    async fn get_missing_task_returns_none() {
        let store = MemoryTaskStore::new();
        assert!(store.get(&TaskId::new("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_status_rejects_wrong_expected_status() {
        let store = MemoryTaskStore::new();
        store.create(fresh_task("t1")).await.unwrap();
        let err = store
            .update_status(&TaskId::new("t1"), Some(TaskStatus::Running), TaskStatus::Succeeded, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CasFailed { .. }));
    }

    #[tokio::test]
    async fn update_status_succeeds_with_matching_expectation() {
        let store = MemoryTaskStore::new();
        store.create(fresh_task("t1")).await.unwrap();
        store.update_status(&TaskId::new("t1"), Some(TaskStatus::Queued), TaskStatus::Running, 5).await.unwrap();
        let task = store.get(&TaskId::new("t1")).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(task.started_at_ms, Some(5));
    }

    #[tokio::test]
    async fn terminal_status_stamps_completed_at() {
        let store = MemoryTaskStore::new();
        store.create(fresh_task("t1")).await.unwrap();
        store.update_status(&TaskId::new("t1"), None, TaskStatus::Succeeded, 10).await.unwrap();
        let task = store.get(&TaskId::new("t1")).await.unwrap().unwrap();
        assert_eq!(task.completed_at_ms, Some(10));
    }

    #[tokio::test]
    async fn event_append_rejected_once_terminal() {
        let store = MemoryTaskStore::new();
        store.create(fresh_task("t1")).await.unwrap();
        store.update_status(&TaskId::new("t1"), None, TaskStatus::Succeeded, 10).await.unwrap();
        let err = store
            .append_event(&TaskId::new("t1"), Event::new(EventKind::TaskStarted, 11, Value::Null))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TerminalAppendRejected(_)));
    }

    #[tokio::test]
    async fn update_step_replaces_matching_id() {
        let store = MemoryTaskStore::new();
        store.create(fresh_task("t1")).await.unwrap();
        let step = Step::new(StepId::new("s1"), "d", "shell", Value::Null);
        store.set_plan(&TaskId::new("t1"), vec![step.clone()]).await.unwrap();

        let mut updated = step.clone();
        updated.status = taskengine_types::StepStatus::Completed;
        store.update_step(&TaskId::new("t1"), updated).await.unwrap();

        let task = store.get(&TaskId::new("t1")).await.unwrap().unwrap();
        assert_eq!(task.plan.unwrap()[0].status, taskengine_types::StepStatus::Completed);
    }

    #[tokio::test]
    async fn list_filters_by_status_and_pages() {
        let store = MemoryTaskStore::new();
        for i in 0..3 {
            let mut t = fresh_task(&format!("t{i}"));
            t.created_at_ms = i as u64;
            store.create(t).await.unwrap();
        }
        store.update_status(&TaskId::new("t1"), None, TaskStatus::Running, 1).await.unwrap();

        let running = store.list(Some(TaskStatus::Running), 10, 0).await.unwrap();
        assert_eq!(running.len(), 1);

        let page = store.list(None, 1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, TaskId::new("t1"));
    }
}
