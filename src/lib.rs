//! Calculation orchestrator
//!
//! An HTTP service that accepts arithmetic expressions, splits each one into
//! single-operation tasks and hands those tasks to polling workers (built-in
//! agent loops or external processes) until the expression's value is known.
//!
//! # Overview
//!
//! - [`evaluation`] validates submissions through an [`Evaluator`]
//! - [`tasks`] plans expressions into dependent tasks, queues them and
//!   tracks which are still outstanding
//! - [`expression`] holds the registry of submitted expressions and their
//!   status
//! - [`service`] ties those together behind [`CalculatorService`]
//! - [`agent`] runs in-process workers; [`api`] serves the HTTP surface
//!
//! # Quick Start
//!
//! ```rust
//! use calc_orchestrator::{CalculatorService, ServerConfig};
//! use calc_orchestrator::tasks::process_task;
//!
//! let service = CalculatorService::new(&ServerConfig::default());
//! let expression = service.submit("2 + 3 * 4").unwrap();
//!
//! while let Some(task) = service.poll_task() {
//!     let value = process_task(&task).unwrap();
//!     service.complete_task(task.id, value).unwrap();
//! }
//!
//! let done = service.expression(&expression.id).unwrap();
//! assert_eq!(done.value(), Some(14.0));
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod expression;
pub mod observability;
pub mod service;
pub mod tasks;
pub mod testing;

pub use config::{ConfigError, OperationTimings, ServerConfig};
pub use error::{CalcError, CalcResult, ErrorResponse};
pub use evaluation::{ArithmeticEvaluator, EvalError, Evaluator};
pub use expression::{Expression, ExpressionRegistry, ExpressionStatus};
pub use service::{CalculatorService, HealthReport};
pub use tasks::{Operation, Task, TaskError};
