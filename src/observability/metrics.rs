//! Service counters
//!
//! Atomic counters owned by the service instance (one set per
//! [`CalculatorService`](crate::service::CalculatorService)), so tests can
//! build isolated services without sharing state.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Thread-safe counters for submissions, tasks and polls
#[derive(Debug)]
pub struct MetricsCollector {
    // Expression lifecycle
    expressions_submitted: AtomicU64,
    expressions_rejected: AtomicU64,
    expressions_completed: AtomicU64,

    // Task flow
    tasks_dispatched: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
    empty_polls: AtomicU64,

    started_at: u64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            expressions_submitted: AtomicU64::new(0),
            expressions_rejected: AtomicU64::new(0),
            expressions_completed: AtomicU64::new(0),
            tasks_dispatched: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            empty_polls: AtomicU64::new(0),
            started_at: current_timestamp(),
        }
    }

    pub fn expression_submitted(&self) {
        self.expressions_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn expression_rejected(&self) {
        self.expressions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn expression_completed(&self) {
        self.expressions_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// A task left the queue for a worker
    pub fn task_dispatched(&self) {
        self.tasks_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn empty_poll(&self) {
        self.empty_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let now = current_timestamp();
        MetricsSnapshot {
            expressions_submitted: self.expressions_submitted.load(Ordering::Relaxed),
            expressions_rejected: self.expressions_rejected.load(Ordering::Relaxed),
            expressions_completed: self.expressions_completed.load(Ordering::Relaxed),
            tasks_dispatched: self.tasks_dispatched.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            empty_polls: self.empty_polls.load(Ordering::Relaxed),
            uptime_seconds: now.saturating_sub(self.started_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub expressions_submitted: u64,
    pub expressions_rejected: u64,
    pub expressions_completed: u64,
    pub tasks_dispatched: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub empty_polls: u64,
    pub uptime_seconds: u64,
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
