//! Mock implementations for testing
//!
//! Provides a scripted [`Evaluator`] so service and API tests can control
//! the validation outcome independently of the bundled arithmetic.

use crate::evaluation::{parse, Ast, EvalError, Evaluator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Evaluator that replays a fixed list of verdicts
///
/// Verdicts are handed out in order and wrap around once exhausted. An empty
/// script accepts every input. Accepted text is parsed with the bundled
/// grammar but never folded, so arithmetic failures such as division by
/// zero reach the task processor.
#[derive(Debug, Default)]
pub struct ScriptedEvaluator {
    outcomes: Vec<Result<(), EvalError>>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl ScriptedEvaluator {
    pub fn new(outcomes: Vec<Result<(), EvalError>>) -> Self {
        Self {
            outcomes,
            ..Default::default()
        }
    }

    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn failing(error: EvalError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Number of `compile` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every text passed to `compile`, in call order
    pub fn inputs(&self) -> Vec<String> {
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Evaluator for ScriptedEvaluator {
    fn compile(&self, text: &str) -> Result<Ast, EvalError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());

        if let Some(verdict) = self.outcomes.get(call % self.outcomes.len().max(1)) {
            verdict.clone()?;
        }
        parse(text)
    }
}
