//! HTTP API
//!
//! Public endpoints under `/api/v1` for clients, `/internal/task` for
//! polling workers, and `/health` for operators. Built from warp filters;
//! [`routes`] exposes the bare filter tree and [`api`] adds JSON rejection
//! handling, CORS and request logging.

use crate::error::{CalcError, ErrorResponse};
use crate::service::CalculatorService;
use bytes::Bytes;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection};

pub mod dto;
pub mod handlers;

/// Largest request body accepted, in bytes
pub const MAX_BODY_BYTES: u64 = 16 * 1024;

fn with_service(
    service: Arc<CalculatorService>,
) -> impl Filter<Extract = (Arc<CalculatorService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

fn body_bytes() -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::bytes())
}

/// All endpoints, without rejection recovery
pub fn routes(
    service: Arc<CalculatorService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let calculate = warp::path!("api" / "v1" / "calculate")
        .and(warp::post())
        .and(body_bytes())
        .and(with_service(service.clone()))
        .and_then(handlers::calculate);

    let list = warp::path!("api" / "v1" / "expressions")
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(handlers::list_expressions);

    let get = warp::path!("api" / "v1" / "expressions" / String)
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(handlers::get_expression);

    let poll = warp::path!("internal" / "task")
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(handlers::poll_task);

    let submit_result = warp::path!("internal" / "task")
        .and(warp::post())
        .and(body_bytes())
        .and(with_service(service.clone()))
        .and_then(handlers::submit_task_result);

    let health = warp::path!("health")
        .and(warp::get())
        .and(with_service(service))
        .and_then(handlers::health);

    calculate
        .or(list)
        .unify()
        .or(get)
        .unify()
        .or(poll)
        .unify()
        .or(submit_result)
        .unify()
        .or(health)
        .unify()
}

/// Complete API filter served by [`ApiServer`]
pub fn api(
    service: Arc<CalculatorService>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(["GET", "POST"])
        .allow_headers(["content-type"]);

    routes(service)
        .with(cors)
        .map(Reply::into_response)
        .recover(handle_rejection)
        .unify()
        .with(warp::log::custom(|info| {
            debug!(
                method = %info.method(),
                path = info.path(),
                status = info.status().as_u16(),
                elapsed_ms = info.elapsed().as_millis() as u64,
                "HTTP request"
            );
        }))
}

/// Render warp's own rejections as JSON error bodies
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "route not found".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "method not allowed".to_string(),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        let err = CalcError::bad_request("Content-Length header is required");
        (err.status_code(), err.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("request body exceeds {MAX_BODY_BYTES} bytes"),
        )
    } else if let Some(forbidden) = err.find::<warp::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, forbidden.to_string())
    } else {
        error!(rejection = ?err, "Unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&ErrorResponse::new(message)), status)
        .into_response())
}

/// HTTP server bound to one address
pub struct ApiServer {
    service: Arc<CalculatorService>,
    addr: SocketAddr,
}

impl ApiServer {
    pub fn new(service: Arc<CalculatorService>, addr: SocketAddr) -> Self {
        Self { service, addr }
    }

    /// Bind the listener and return the bound address plus the serving future
    ///
    /// The future resolves once `shutdown_rx` flips to `true` (or its sender
    /// is dropped) and in-flight requests have finished.
    pub fn bind(
        self,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(SocketAddr, impl Future<Output = ()>), CalcError> {
        let signal = async move {
            while !*shutdown_rx.borrow() {
                if shutdown_rx.changed().await.is_err() {
                    break;
                }
            }
            info!("HTTP server shutting down");
        };

        let (bound, server) = warp::serve(api(self.service))
            .try_bind_with_graceful_shutdown(self.addr, signal)
            .map_err(|e| CalcError::internal_error(format!("failed to bind {}: {e}", self.addr)))?;

        info!(addr = %bound, "HTTP server listening");
        Ok((bound, server))
    }
}
