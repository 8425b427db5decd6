//! Calculation service
//!
//! [`CalculatorService`] owns the registry, queue and task graph and is
//! shared (behind an `Arc`) by the HTTP handlers and every agent loop. Each
//! instance is fully independent, so tests can construct as many as they
//! need.

use crate::config::{OperationTimings, ServerConfig};
use crate::error::CalcResult;
use crate::evaluation::{ArithmeticEvaluator, Evaluator};
use crate::expression::{Expression, ExpressionRegistry, ExpressionStatus};
use crate::expression_span;
use crate::observability::{MetricsCollector, MetricsSnapshot};
use crate::tasks::graph::Resolution;
use crate::tasks::{Plan, Task, TaskError, TaskGraph, TaskQueue};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct CalculatorService {
    registry: Arc<ExpressionRegistry>,
    queue: Arc<TaskQueue>,
    graph: TaskGraph,
    evaluator: Arc<dyn Evaluator>,
    timings: OperationTimings,
    metrics: MetricsCollector,
}

/// Point-in-time view served on `/health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: i64,
    pub queue_depth: usize,
    pub queue_capacity: usize,
    pub outstanding_tasks: usize,
    pub dispatched_tasks: usize,
    pub expressions: usize,
    pub metrics: MetricsSnapshot,
}

impl CalculatorService {
    /// Create a service using the built-in arithmetic evaluator
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_evaluator(config, Arc::new(ArithmeticEvaluator::new()))
    }

    /// Create a service with a custom evaluation collaborator
    pub fn with_evaluator(config: &ServerConfig, evaluator: Arc<dyn Evaluator>) -> Self {
        let registry = Arc::new(ExpressionRegistry::new());
        let queue = Arc::new(TaskQueue::new(config.queue.capacity));
        let graph = TaskGraph::new(queue.clone(), registry.clone());

        Self {
            registry,
            queue,
            graph,
            evaluator,
            timings: config.timings.clone(),
            metrics: MetricsCollector::new(),
        }
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn registry(&self) -> &ExpressionRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Validate a formula and schedule its tasks
    ///
    /// The evaluation collaborator decides whether the text is accepted and
    /// supplies the operation tree that gets planned; its error is returned
    /// unchanged otherwise. On success exactly one expression is registered
    /// and returned, `pending` unless the tree is a bare number.
    pub fn submit(&self, text: &str) -> CalcResult<Expression> {
        let span = expression_span!("submit", expression = %text);
        let _guard = span.enter();

        let outcome = self.plan_and_admit(text);
        match &outcome {
            Ok(expression) => {
                self.metrics.expression_submitted();
                if expression.status == ExpressionStatus::Completed {
                    self.metrics.expression_completed();
                }
                info!(
                    expression_id = %expression.id,
                    status = %expression.status,
                    "Expression accepted"
                );
            }
            Err(e) => {
                self.metrics.expression_rejected();
                debug!(error = %e, "Expression rejected");
            }
        }
        outcome
    }

    fn plan_and_admit(&self, text: &str) -> CalcResult<Expression> {
        let ast = self.evaluator.compile(text)?;

        let expression = Expression::pending(text);
        let plan = Plan::build(&expression.id, &ast, &self.timings);
        self.graph.admit(expression, plan)
    }

    pub fn expression(&self, id: &str) -> CalcResult<Expression> {
        Ok(self.registry.get(id)?)
    }

    pub fn expressions(&self) -> Vec<Expression> {
        self.registry.list()
    }

    /// Hand out the next queued task, if any, without waiting
    pub fn poll_task(&self) -> Option<Task> {
        match self.graph.dispatch() {
            Some(task) => {
                self.metrics.task_dispatched();
                debug!(
                    task_id = %task.id,
                    expression_id = %task.expression_id,
                    "Task dispatched"
                );
                Some(task)
            }
            None => {
                self.metrics.empty_poll();
                None
            }
        }
    }

    /// Accept a worker's value for a dispatched task
    pub fn complete_task(&self, task_id: Uuid, value: f64) -> CalcResult<Resolution> {
        if !value.is_finite() {
            return Err(TaskError::InvalidResult(value).into());
        }

        let resolution = self.graph.resolve(task_id, value)?;
        self.metrics.task_completed();
        if matches!(resolution, Resolution::Completed { .. }) {
            self.metrics.expression_completed();
        }
        Ok(resolution)
    }

    /// Record that a dispatched task could not be computed
    ///
    /// The task chain is dropped and its expression stays pending.
    pub fn fail_task(&self, task_id: Uuid, error: &TaskError) -> CalcResult<usize> {
        self.metrics.task_failed();
        warn!(task_id = %task_id, error = %error, "Task failed");
        self.graph.abandon(task_id)
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            queue_depth: self.queue.len(),
            queue_capacity: self.queue.capacity(),
            outstanding_tasks: self.graph.outstanding(),
            dispatched_tasks: self.graph.dispatched(),
            expressions: self.registry.len(),
            metrics: self.metrics.snapshot(),
        }
    }
}
