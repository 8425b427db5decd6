//! Thread-safe expression registry
//!
//! The single source of truth for expression status and result. All access
//! goes through one lock, so an `update` is never observed half-applied by
//! `get` or `list`. Records are never removed.

use super::Expression;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("expression not found: {0}")]
    NotFound(String),
    #[error("duplicate expression id: {0}")]
    DuplicateId(String),
}

#[derive(Debug, Default)]
pub struct ExpressionRegistry {
    expressions: RwLock<HashMap<String, Expression>>,
}

impl ExpressionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record
    pub fn put(&self, expression: Expression) -> Result<(), RegistryError> {
        let mut expressions = self
            .expressions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if expressions.contains_key(&expression.id) {
            return Err(RegistryError::DuplicateId(expression.id));
        }

        debug!(
            expression_id = %expression.id,
            status = %expression.status,
            "Registered expression"
        );
        expressions.insert(expression.id.clone(), expression);
        Ok(())
    }

    /// Snapshot of one record
    pub fn get(&self, id: &str) -> Result<Expression, RegistryError> {
        self.expressions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Atomically apply `mutator` to an existing record
    pub fn update<F, R>(&self, id: &str, mutator: F) -> Result<R, RegistryError>
    where
        F: FnOnce(&mut Expression) -> R,
    {
        let mut expressions = self
            .expressions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let expression = expressions
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        Ok(mutator(expression))
    }

    /// Snapshot of all records in unspecified order
    pub fn list(&self) -> Vec<Expression> {
        self.expressions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.expressions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
