//! Request handlers
//!
//! Handlers never reject; every failure is rendered as a JSON
//! [`ErrorResponse`](crate::error::ErrorResponse) with the status mapped by
//! [`CalcError::status_code`].

use super::dto::{decode, CalculateRequest, ExpressionList, IdResponse, TaskResultRequest};
use crate::error::{CalcError, ErrorResponse};
use crate::service::CalculatorService;
use bytes::Bytes;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error};
use warp::http::StatusCode;
use warp::reply::{Reply, Response};

fn json_reply<T: Serialize>(body: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

pub(crate) fn error_reply(err: &CalcError) -> Response {
    if err.is_client_error() {
        debug!(error = %err, status = %err.status_code(), "Request failed");
    } else {
        error!(error = %err, status = %err.status_code(), "Request failed");
    }
    json_reply(&err.to_response(), err.status_code())
}

/// POST /api/v1/calculate
pub async fn calculate(
    body: Bytes,
    service: Arc<CalculatorService>,
) -> Result<Response, Infallible> {
    let outcome = decode::<CalculateRequest>(&body)
        .and_then(|request| service.submit(&request.expression));

    Ok(match outcome {
        Ok(expression) => json_reply(&IdResponse { id: expression.id }, StatusCode::CREATED),
        Err(e) => error_reply(&e),
    })
}

/// GET /api/v1/expressions
pub async fn list_expressions(service: Arc<CalculatorService>) -> Result<Response, Infallible> {
    let list = ExpressionList {
        expressions: service.expressions(),
    };
    Ok(json_reply(&list, StatusCode::OK))
}

/// GET /api/v1/expressions/{id}
pub async fn get_expression(
    id: String,
    service: Arc<CalculatorService>,
) -> Result<Response, Infallible> {
    Ok(match service.expression(&id) {
        Ok(expression) => json_reply(&expression, StatusCode::OK),
        Err(e) => error_reply(&e),
    })
}

/// GET /internal/task
pub async fn poll_task(service: Arc<CalculatorService>) -> Result<Response, Infallible> {
    Ok(match service.poll_task() {
        Some(task) => json_reply(&task, StatusCode::OK),
        None => json_reply(
            &ErrorResponse::new("no task available"),
            StatusCode::NOT_FOUND,
        ),
    })
}

/// POST /internal/task
pub async fn submit_task_result(
    body: Bytes,
    service: Arc<CalculatorService>,
) -> Result<Response, Infallible> {
    let outcome = decode::<TaskResultRequest>(&body).and_then(|request| {
        service
            .complete_task(request.id, request.result)
            .map(|_| request.id)
    });

    Ok(match outcome {
        Ok(task_id) => json_reply(
            &IdResponse {
                id: task_id.to_string(),
            },
            StatusCode::OK,
        ),
        Err(e) => error_reply(&e),
    })
}

/// GET /health
pub async fn health(service: Arc<CalculatorService>) -> Result<Response, Infallible> {
    Ok(json_reply(&service.health(), StatusCode::OK))
}
