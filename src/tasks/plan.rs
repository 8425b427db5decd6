//! Lowering a parsed expression into dependent tasks

use super::{Operation, Task};
use crate::config::OperationTimings;
use crate::evaluation::Ast;
use uuid::Uuid;

/// One side of a planned operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// Known value
    Value(f64),
    /// Produced by the task with this id once it resolves
    Pending(Uuid),
}

/// Which operand of the parent a child task feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Left,
    Right,
}

/// A task that may still be waiting on its operands
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTask {
    pub id: Uuid,
    pub expression_id: String,
    pub operation: Operation,
    pub left: Operand,
    pub right: Operand,
    pub parent: Option<(Uuid, Slot)>,
    pub operation_time: u64,
}

impl PlannedTask {
    /// Substitute a resolved child value into `slot`
    pub fn fill(&mut self, slot: Slot, value: f64) {
        match slot {
            Slot::Left => self.left = Operand::Value(value),
            Slot::Right => self.right = Operand::Value(value),
        }
    }

    /// Queueable form, available once both operands are known
    pub fn ready_task(&self) -> Option<Task> {
        match (self.left, self.right) {
            (Operand::Value(arg1), Operand::Value(arg2)) => Some(Task {
                id: self.id,
                expression_id: self.expression_id.clone(),
                arg1,
                arg2,
                operation: self.operation,
                operation_time: self.operation_time,
            }),
            _ => None,
        }
    }
}

/// All tasks required to compute one expression
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub expression_id: String,
    /// Final value, or the task that produces it
    pub root: Operand,
    /// Children always precede their parent
    pub tasks: Vec<PlannedTask>,
}

impl Plan {
    pub fn build(expression_id: &str, ast: &Ast, timings: &OperationTimings) -> Self {
        let mut tasks = Vec::with_capacity(ast.operation_count());
        let root = lower(expression_id, ast, None, timings, &mut tasks);
        Self {
            expression_id: expression_id.to_string(),
            root,
            tasks,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks that can be queued immediately
    pub fn ready_tasks(&self) -> Vec<Task> {
        self.tasks.iter().filter_map(PlannedTask::ready_task).collect()
    }
}

fn lower(
    expression_id: &str,
    ast: &Ast,
    parent: Option<(Uuid, Slot)>,
    timings: &OperationTimings,
    out: &mut Vec<PlannedTask>,
) -> Operand {
    match ast {
        Ast::Number(n) => Operand::Value(*n),
        Ast::Binary {
            operation,
            lhs,
            rhs,
        } => {
            let id = Uuid::new_v4();
            let left = lower(expression_id, lhs, Some((id, Slot::Left)), timings, out);
            let right = lower(expression_id, rhs, Some((id, Slot::Right)), timings, out);
            out.push(PlannedTask {
                id,
                expression_id: expression_id.to_string(),
                operation: *operation,
                left,
                right,
                parent,
                operation_time: timings.for_operation(*operation),
            });
            Operand::Pending(id)
        }
    }
}
