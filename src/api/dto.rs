//! Request and response bodies for the HTTP API

use crate::error::CalcError;
use crate::expression::Expression;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `POST /api/v1/calculate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub expression: String,
}

/// Returned when an expression or task result is accepted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: String,
}

/// `GET /api/v1/expressions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionList {
    pub expressions: Vec<Expression>,
}

/// `POST /internal/task`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultRequest {
    pub id: Uuid,
    pub result: f64,
}

/// Decode a JSON body, mapping any failure to a bad request
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, CalcError> {
    if body.is_empty() {
        return Err(CalcError::bad_request("request body is empty"));
    }
    serde_json::from_slice(body)
        .map_err(|e| CalcError::bad_request(format!("invalid request body: {e}")))
}
