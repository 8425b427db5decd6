//! Error types for the calculation service
//!
//! Module-level errors (evaluation, tasks, registry, queue, config) fold into
//! [`CalcError`], which also knows the HTTP status each failure maps to.

use crate::config::ConfigError;
use crate::evaluation::EvalError;
use crate::expression::{RegistryError, TransitionError};
use crate::tasks::queue::QueueFull;
use crate::tasks::TaskError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use warp::http::StatusCode;

/// Main error type for service operations
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Evaluation(#[from] EvalError),

    #[error(transparent)]
    QueueFull(#[from] QueueFull),

    #[error("Task failed: {0}")]
    Task(#[from] TaskError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Unknown or already resolved task: {0}")]
    UnknownTask(Uuid),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create bad request error
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status for this failure
    pub fn status_code(&self) -> StatusCode {
        match self {
            CalcError::BadRequest { .. } | CalcError::Evaluation(_) => StatusCode::BAD_REQUEST,
            CalcError::UnknownTask(_)
            | CalcError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            CalcError::QueueFull(_) => StatusCode::SERVICE_UNAVAILABLE,
            CalcError::Task(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CalcError::Transition(_) => StatusCode::CONFLICT,
            CalcError::Registry(RegistryError::DuplicateId(_))
            | CalcError::Config(_)
            | CalcError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure was caused by the caller
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// JSON body for this failure
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.to_string())
    }
}

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: i64,
}

impl ErrorResponse {
    pub fn new<S: Into<String>>(error: S) -> Self {
        Self {
            error: error.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Result type for service operations
pub type CalcResult<T> = Result<T, CalcError>;
