//! Submitted expressions and their lifecycle
//!
//! An [`Expression`] is created `pending` by submission (or `completed`
//! straight away when it is a bare number) and moves to `completed` exactly
//! once, when the task producing its final value resolves.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub mod registry;

pub use registry::{ExpressionRegistry, RegistryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionStatus {
    Pending,
    Completed,
}

impl fmt::Display for ExpressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionStatus::Pending => write!(f, "pending"),
            ExpressionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Rejected status change
#[derive(Debug, Clone, Error, PartialEq)]
#[error("expression {id} cannot move from {from} to completed")]
pub struct TransitionError {
    pub id: String,
    pub from: ExpressionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub id: String,
    pub expression: String,
    pub status: ExpressionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
}

impl Expression {
    /// New pending expression with a freshly generated id
    pub fn pending(expression: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            expression: expression.into(),
            status: ExpressionStatus::Pending,
            result: None,
        }
    }

    /// Apply the pending → completed transition
    pub fn complete(&mut self, result: f64) -> Result<(), TransitionError> {
        if self.status != ExpressionStatus::Pending {
            return Err(TransitionError {
                id: self.id.clone(),
                from: self.status,
            });
        }
        self.status = ExpressionStatus::Completed;
        self.result = Some(result);
        Ok(())
    }

    /// Result, only once the expression has completed
    pub fn value(&self) -> Option<f64> {
        match self.status {
            ExpressionStatus::Completed => self.result,
            ExpressionStatus::Pending => None,
        }
    }
}

/// Opaque, collision-free expression identifier
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
