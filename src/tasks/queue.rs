//! Bounded FIFO of tasks awaiting a worker
//!
//! Producers never block: a push that would exceed capacity is rejected with
//! [`QueueFull`]. Consumers either take a task immediately with
//! [`TaskQueue::try_pop`] or park on [`TaskQueue::wait`] until a producer
//! signals new work.

use super::Task;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Notify;
use tracing::debug;

/// Push rejected because the queue is at capacity
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("task queue is full (capacity {capacity})")]
pub struct QueueFull {
    pub capacity: usize,
}

pub struct TaskQueue {
    tasks: Mutex<VecDeque<Task>>,
    capacity: usize,
    available: Notify,
}

impl TaskQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            available: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Enqueue one task, or reject it when full
    pub fn push(&self, task: Task) -> Result<(), QueueFull> {
        self.push_all(vec![task])
    }

    /// Enqueue a batch all-or-nothing
    pub fn push_all(&self, batch: Vec<Task>) -> Result<(), QueueFull> {
        if batch.is_empty() {
            return Ok(());
        }

        let count = batch.len();
        {
            let mut tasks = self.lock();
            if tasks.len() + count > self.capacity {
                return Err(QueueFull {
                    capacity: self.capacity,
                });
            }
            tasks.extend(batch);
            debug!(enqueued = count, depth = tasks.len(), "Tasks enqueued");
        }

        for _ in 0..count {
            self.available.notify_one();
        }
        Ok(())
    }

    /// Take the oldest task without waiting
    ///
    /// Each task is returned to exactly one caller.
    pub fn try_pop(&self) -> Option<Task> {
        self.lock().pop_front()
    }

    /// Park until a producer signals that work was enqueued
    ///
    /// A signal sent while nobody waits is kept, so a consumer that found the
    /// queue empty and then calls `wait` does not miss a concurrent push.
    /// Wake-ups may be spurious; callers re-check with [`TaskQueue::try_pop`].
    pub async fn wait(&self) {
        self.available.notified().await;
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
