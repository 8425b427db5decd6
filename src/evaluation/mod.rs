//! Expression evaluation collaborator
//!
//! The service core never interprets formula text itself; it asks an
//! [`Evaluator`] to accept a submission and hand back the operation tree
//! that gets planned into tasks. The bundled [`ArithmeticEvaluator`] handles
//! `+ - * /` with parentheses and unary signs and only accepts trees that
//! fold to a finite number, applying every operation through the same
//! arithmetic the task processor uses so that anything it accepts can be
//! planned into tasks that succeed.

use crate::tasks::processor::apply;
use crate::tasks::TaskError;
use thiserror::Error;

pub mod parser;

pub use parser::{parse, Ast};

/// Failure reported by an evaluation collaborator
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    #[error("parse error at position {position}: {message}")]
    Parse { message: String, position: usize },

    #[error("evaluation error: {message}")]
    Evaluation { message: String },
}

impl EvalError {
    /// Create parse error
    pub fn parse<S: Into<String>>(message: S, position: usize) -> Self {
        Self::Parse {
            message: message.into(),
            position,
        }
    }

    /// Create evaluation error
    pub fn evaluation<S: Into<String>>(message: S) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }
}

impl From<TaskError> for EvalError {
    fn from(err: TaskError) -> Self {
        EvalError::evaluation(err.to_string())
    }
}

/// Synchronous, side-effect free formula evaluation
pub trait Evaluator: Send + Sync {
    /// Accept `text` and return the operation tree to schedule
    fn compile(&self, text: &str) -> Result<Ast, EvalError>;

    /// Evaluate `text` to a finite number
    fn evaluate(&self, text: &str) -> Result<f64, EvalError> {
        fold_finite(&self.compile(text)?)
    }
}

/// Fold a tree, additionally rejecting a non-finite final value
pub fn fold_finite(ast: &Ast) -> Result<f64, EvalError> {
    let value = ArithmeticEvaluator::fold(ast)?;
    if !value.is_finite() {
        return Err(EvalError::evaluation(format!(
            "expression produced a non-finite value: {value}"
        )));
    }
    Ok(value)
}

/// Default evaluator for infix arithmetic over `f64`
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticEvaluator;

impl ArithmeticEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Fold an already-parsed tree, rejecting division by zero and any
    /// non-finite intermediate value
    pub fn fold(ast: &Ast) -> Result<f64, EvalError> {
        match ast {
            Ast::Number(n) => Ok(*n),
            Ast::Binary {
                operation,
                lhs,
                rhs,
            } => {
                let a = Self::fold(lhs)?;
                let b = Self::fold(rhs)?;
                Ok(apply(*operation, a, b)?)
            }
        }
    }
}

impl Evaluator for ArithmeticEvaluator {
    fn compile(&self, text: &str) -> Result<Ast, EvalError> {
        let ast = parse(text)?;
        fold_finite(&ast)?;
        Ok(ast)
    }
}
