//! In-process worker loop
//!
//! Each [`AgentLoop`] repeatedly takes a task from the service queue,
//! waits out the task's simulated operation time, computes it and reports
//! the outcome back. When the queue is empty it parks on the queue's wake
//! signal instead of spinning.

use crate::service::CalculatorService;
use crate::tasks::graph::Resolution;
use crate::tasks::{process_task, Task};
use crate::task_span;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

pub struct AgentLoop {
    id: usize,
    service: Arc<CalculatorService>,
    shutdown_rx: watch::Receiver<bool>,
}

impl AgentLoop {
    pub fn new(
        id: usize,
        service: Arc<CalculatorService>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            service,
            shutdown_rx,
        }
    }

    /// Run until shutdown is signalled or the shutdown sender is dropped
    ///
    /// Returns how many tasks this loop processed.
    pub async fn run(mut self) -> usize {
        info!(agent = self.id, "Agent loop started");
        let mut processed = 0;

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            let Some(task) = self.service.poll_task() else {
                if !self.wait_for_work().await {
                    break;
                }
                continue;
            };

            let span = task_span!(
                agent = self.id,
                task_id = %task.id,
                expression_id = %task.expression_id,
                operation = %task.operation
            );
            if !self.handle(task).instrument(span).await {
                break;
            }
            processed += 1;
        }

        info!(agent = self.id, processed, "Agent loop stopped");
        processed
    }

    /// Park until a task is queued; false means stop
    async fn wait_for_work(&mut self) -> bool {
        let queue = self.service.queue();
        tokio::select! {
            changed = self.shutdown_rx.changed() => {
                changed.is_ok() && !*self.shutdown_rx.borrow()
            }
            _ = queue.wait() => true,
        }
    }

    /// Process one task; false means shutdown interrupted it
    async fn handle(&mut self, task: Task) -> bool {
        if task.operation_time > 0 && !self.interruptible_sleep(task.operation_time).await {
            warn!(task_id = %task.id, "Shutdown during operation delay; task left unresolved");
            return false;
        }

        match process_task(&task) {
            Ok(value) => match self.service.complete_task(task.id, value) {
                Ok(Resolution::Completed {
                    expression_id,
                    result,
                }) => {
                    debug!(expression_id = %expression_id, result, "Root task resolved");
                }
                Ok(resolution) => debug!(?resolution, "Task resolved"),
                Err(e) => warn!(error = %e, "Could not record task result"),
            },
            Err(e) => {
                if let Err(abandon_err) = self.service.fail_task(task.id, &e) {
                    warn!(error = %abandon_err, "Could not abandon failed task");
                }
            }
        }
        true
    }

    /// Sleep for `delay_ms`, returning false if shutdown was requested first
    async fn interruptible_sleep(&mut self, delay_ms: u64) -> bool {
        tokio::select! {
            changed = self.shutdown_rx.changed() => {
                changed.is_ok() && !*self.shutdown_rx.borrow()
            }
            _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => true,
        }
    }
}

/// Start `count` agent loops sharing one service
pub fn spawn_agents(
    count: usize,
    service: Arc<CalculatorService>,
    shutdown_rx: watch::Receiver<bool>,
) -> Vec<JoinHandle<usize>> {
    (0..count)
        .map(|id| {
            let agent = AgentLoop::new(id, service.clone(), shutdown_rx.clone());
            tokio::spawn(agent.run())
        })
        .collect()
}
