//! FIFO job queue, standing in for the external queue the Worker Loop
//! pulls task IDs from.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use taskengine_types::TaskId;

/// Hands task IDs to workers in the order they were enqueued.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a task ID for pickup by some worker.
    async fn enqueue(&self, task_id: TaskId);

    /// Wait for and remove the next task ID. Returns `None` if `cancel`
    /// fires before an item becomes available.
    async fn dequeue(&self, cancel: &CancellationToken) -> Option<TaskId>;
}

/// In-process FIFO queue backed by a `VecDeque`, woken via `Notify`.
#[derive(Default)]
pub struct MemoryJobQueue {
    items: Mutex<VecDeque<TaskId>>,
    notify: Notify,
}

impl MemoryJobQueue {
    /// Create a new, empty queue.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, task_id: TaskId) {
        self.items.lock().await.push_back(task_id);
        self.notify.notify_one();
    }

    async fn dequeue(&self, cancel: &CancellationToken) -> Option<TaskId> {
        loop {
            if let Some(id) = self.items.lock().await.pop_front() {
                return Some(id);
            }
            tokio::select! {
                _ = self.notify.notified() => continue,
                _ = cancel.cancelled() => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dequeue_returns_items_in_fifo_order() {
        let queue = MemoryJobQueue::new();
        queue.enqueue(TaskId::new("t1")).await;
        queue.enqueue(TaskId::new("t2")).await;

        let cancel = CancellationToken::new();
        assert_eq!(queue.dequeue(&cancel).await, Some(TaskId::new("t1")));
        assert_eq!(queue.dequeue(&cancel).await, Some(TaskId::new("t2")));
    }

    #[tokio::test]
    async fn dequeue_wakes_on_enqueue() {
        let queue = std::sync::Arc::new(MemoryJobQueue::new());
        let cancel = CancellationToken::new();

        let waiter = {
            let queue = queue.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { queue.dequeue(&cancel).await })
        };

        tokio::task::yield_now().await;
        queue.enqueue(TaskId::new("t1")).await;

        let result = waiter.await.unwrap();
        assert_eq!(result, Some(TaskId::new("t1")));
    }

    #[tokio::test]
    async fn dequeue_returns_none_on_cancellation() {
        let queue = MemoryJobQueue::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(queue.dequeue(&cancel).await, None);
    }
}
