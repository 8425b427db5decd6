//! Arithmetic tasks handed to polling workers
//!
//! A [`Task`] is one two-operand operation split out of a submitted
//! expression. Tasks travel through the bounded [`TaskQueue`], are consumed
//! by exactly one worker, and are resolved back into their expression by
//! the [`TaskGraph`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub mod graph;
pub mod plan;
pub mod processor;
pub mod queue;

pub use graph::TaskGraph;
pub use plan::{Operand, Plan, PlannedTask, Slot};
pub use processor::process_task;
pub use queue::TaskQueue;

/// The fixed operator set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
}

impl Operation {
    pub fn symbol(self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Subtract => '-',
            Operation::Multiply => '*',
            Operation::Divide => '/',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Operation::Add),
            '-' => Some(Operation::Subtract),
            '*' => Some(Operation::Multiply),
            '/' => Some(Operation::Divide),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A single queued arithmetic operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    /// Expression this task contributes to
    pub expression_id: String,
    pub arg1: f64,
    pub arg2: f64,
    pub operation: Operation,
    /// Simulated duration in milliseconds
    pub operation_time: u64,
}

impl Task {
    /// Build a standalone task, mainly useful for feeding the queue directly
    pub fn new(
        expression_id: impl Into<String>,
        arg1: f64,
        operation: Operation,
        arg2: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            expression_id: expression_id.into(),
            arg1,
            arg2,
            operation,
            operation_time: 0,
        }
    }
}

/// Task processing failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TaskError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("operation produced an invalid result: {0}")]
    InvalidResult(f64),
}
