//! Dependency tracking between tasks of in-flight expressions
//!
//! The graph owns every outstanding task (queued, handed to a worker, or
//! waiting for operands). A task leaves the graph exactly once, through
//! [`TaskGraph::resolve`] or [`TaskGraph::abandon`].
//!
//! Admission counts queued and waiting tasks against the queue capacity.
//! Tasks handed to a worker through [`TaskGraph::dispatch`] stop counting,
//! since a worker may never report back. Every waiting task is still counted,
//! so promoting one into the queue cannot overflow it.

use super::{Operand, Plan, PlannedTask, Task, TaskQueue};
use crate::error::{CalcError, CalcResult};
use crate::expression::{Expression, ExpressionRegistry};
use crate::tasks::queue::QueueFull;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What resolving a task led to
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The task produced the expression's final value
    Completed { expression_id: String, result: f64 },
    /// The parent received its last operand and was queued
    Promoted { task_id: Uuid },
    /// The parent still waits on its other operand
    Waiting { task_id: Uuid },
    /// The parent was abandoned earlier; the value is discarded
    Orphaned { task_id: Uuid },
}

#[derive(Default)]
struct Tracked {
    tasks: HashMap<Uuid, PlannedTask>,
    dispatched: HashSet<Uuid>,
}

impl Tracked {
    /// Queued or waiting tasks; the ones that hold queue capacity
    fn reserved(&self) -> usize {
        self.tasks.len() - self.dispatched.len()
    }

    fn remove(&mut self, task_id: &Uuid) -> Option<PlannedTask> {
        self.dispatched.remove(task_id);
        self.tasks.remove(task_id)
    }
}

pub struct TaskGraph {
    state: Mutex<Tracked>,
    queue: Arc<TaskQueue>,
    registry: Arc<ExpressionRegistry>,
}

impl TaskGraph {
    pub fn new(queue: Arc<TaskQueue>, registry: Arc<ExpressionRegistry>) -> Self {
        Self {
            state: Mutex::new(Tracked::default()),
            queue,
            registry,
        }
    }

    /// Tasks not yet resolved or abandoned
    pub fn outstanding(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Tasks handed to a worker and not yet reported back
    pub fn dispatched(&self) -> usize {
        self.lock().dispatched.len()
    }

    /// Register a new expression together with its plan
    ///
    /// Ready tasks are queued, the expression is inserted into the registry
    /// and waiting tasks are remembered, all while holding the graph lock so
    /// no resolution can run before the expression exists. A plan without
    /// tasks completes the expression immediately. On [`QueueFull`] nothing
    /// is recorded.
    pub fn admit(&self, mut expression: Expression, plan: Plan) -> CalcResult<Expression> {
        let mut state = self.lock();

        match plan.root {
            Operand::Value(value) => expression.complete(value)?,
            Operand::Pending(_) => {
                let capacity = self.queue.capacity();
                if state.reserved() + plan.len() > capacity {
                    return Err(QueueFull { capacity }.into());
                }
                self.queue.push_all(plan.ready_tasks())?;
            }
        }

        self.registry.put(expression.clone())?;

        let planned = plan.len();
        state
            .tasks
            .extend(plan.tasks.into_iter().map(|task| (task.id, task)));

        debug!(
            expression_id = %expression.id,
            planned_tasks = planned,
            outstanding = state.tasks.len(),
            "Expression admitted"
        );
        Ok(expression)
    }

    /// Take the oldest queued task and hand it to a worker
    ///
    /// The task stays resolvable but no longer holds queue capacity.
    pub fn dispatch(&self) -> Option<Task> {
        let mut state = self.lock();
        let task = self.queue.try_pop()?;
        if state.tasks.contains_key(&task.id) {
            state.dispatched.insert(task.id);
        }
        Some(task)
    }

    /// Record a computed value for `task_id`
    ///
    /// Each task resolves at most once; later calls fail with
    /// [`CalcError::UnknownTask`].
    pub fn resolve(&self, task_id: Uuid, value: f64) -> CalcResult<Resolution> {
        let mut state = self.lock();
        let task = state.remove(&task_id).ok_or(CalcError::UnknownTask(task_id))?;

        let Some((parent_id, slot)) = task.parent else {
            self.registry
                .update(&task.expression_id, |e| e.complete(value))??;
            info!(
                expression_id = %task.expression_id,
                result = value,
                "Expression completed"
            );
            return Ok(Resolution::Completed {
                expression_id: task.expression_id,
                result: value,
            });
        };

        let Some(parent) = state.tasks.get_mut(&parent_id) else {
            debug!(task_id = %task_id, parent_id = %parent_id, "Parent already abandoned");
            return Ok(Resolution::Orphaned { task_id: parent_id });
        };

        parent.fill(slot, value);
        match parent.ready_task() {
            Some(ready) => {
                self.queue.push(ready)?;
                Ok(Resolution::Promoted { task_id: parent_id })
            }
            None => Ok(Resolution::Waiting { task_id: parent_id }),
        }
    }

    /// Drop a task that failed, together with every ancestor waiting on it
    ///
    /// The expression itself is left untouched. Returns how many tasks were
    /// removed.
    pub fn abandon(&self, task_id: Uuid) -> CalcResult<usize> {
        let mut state = self.lock();
        let mut current = state.remove(&task_id).ok_or(CalcError::UnknownTask(task_id))?;
        let mut removed = 1;

        while let Some((parent_id, _)) = current.parent {
            match state.remove(&parent_id) {
                Some(parent) => {
                    removed += 1;
                    current = parent;
                }
                None => break,
            }
        }

        warn!(
            task_id = %task_id,
            expression_id = %current.expression_id,
            removed,
            "Abandoned task chain; expression stays pending"
        );
        Ok(removed)
    }

    fn lock(&self) -> MutexGuard<'_, Tracked> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
