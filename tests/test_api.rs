//! HTTP API tests
//!
//! Requests go through the complete warp filter in-process, so these cover
//! routing, body decoding, status codes and JSON shapes together.


use calc_orchestrator::api::api;
use calc_orchestrator::CalculatorService;
use serde_json::{json, Value};
use std::sync::Arc;
use test_helpers::{drain, test_config, test_service};
use warp::http::StatusCode;

async fn post_json(
    service: &Arc<CalculatorService>,
    path: &str,
    body: Value,
) -> (StatusCode, Value) {
    let resp = warp::test::request()
        .method("POST")
        .path(path)
        .json(&body)
        .reply(&api(service.clone()))
        .await;
    (resp.status(), parse_body(resp.body()))
}

async fn get(service: &Arc<CalculatorService>, path: &str) -> (StatusCode, Value) {
    let resp = warp::test::request()
        .method("GET")
        .path(path)
        .reply(&api(service.clone()))
        .await;
    (resp.status(), parse_body(resp.body()))
}

fn parse_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

async fn submit(service: &Arc<CalculatorService>, expression: &str) -> String {
    let (status, body) =
        post_json(service, "/api/v1/calculate", json!({ "expression": expression })).await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_calculate_then_fetch_completed_result() {
    let service = test_service();
    let id = submit(&service, "2 + 3 * 4").await;

    let (status, body) = get(&service, &format!("/api/v1/expressions/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["expression"], "2 + 3 * 4");
    assert_eq!(body["status"], "pending");
    assert!(body.get("result").is_none());

    drain(&service);

    let (status, body) = get(&service, &format!("/api/v1/expressions/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["result"], 14.0);
}

#[tokio::test]
async fn test_literal_is_completed_on_creation() {
    let service = test_service();
    let id = submit(&service, "5").await;

    let (_, body) = get(&service, &format!("/api/v1/expressions/{id}")).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["result"], 5.0);
}

#[tokio::test]
async fn test_zero_result_is_serialized() {
    let service = test_service();
    let id = submit(&service, "3 - 3").await;
    drain(&service);

    let (_, body) = get(&service, &format!("/api/v1/expressions/{id}")).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["result"], 0.0);
}

#[tokio::test]
async fn test_invalid_expression_is_bad_request() {
    let service = test_service();
    let (status, body) =
        post_json(&service, "/api/v1/calculate", json!({ "expression": "2 + " })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("parse error"));
    assert!(body["timestamp"].is_i64());

    let (_, list) = get(&service, "/api/v1/expressions").await;
    assert_eq!(list["expressions"], json!([]));
}

#[tokio::test]
async fn test_division_by_zero_is_bad_request() {
    let service = test_service();
    let (status, body) =
        post_json(&service, "/api/v1/calculate", json!({ "expression": "10 / 0" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("division by zero"));
    assert!(service.expressions().is_empty());
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let service = test_service();

    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/calculate")
        .body("{not json")
        .reply(&api(service.clone()))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (status, _) =
        post_json(&service, "/api/v1/calculate", json!({ "formula": "1 + 1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/calculate")
        .reply(&api(service.clone()))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error = parse_body(resp.body())["error"].as_str().unwrap().to_string();
    assert!(error.contains("Content-Length"), "error: {error}");

    assert!(service.expressions().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let service = test_service();
    let expression = "1 + ".repeat(5_000) + "1";
    let (status, _) = post_json(
        &service,
        "/api/v1/calculate",
        json!({ "expression": expression }),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_unknown_expression_is_not_found() {
    let service = test_service();
    let (status, body) = get(&service, "/api/v1/expressions/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("does-not-exist"));
}

#[tokio::test]
async fn test_list_expressions() {
    let service = test_service();
    let first = submit(&service, "1 + 1").await;
    let second = submit(&service, "2").await;

    let (status, body) = get(&service, "/api/v1/expressions").await;
    assert_eq!(status, StatusCode::OK);

    let mut ids: Vec<&str> = body["expressions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    ids.sort_unstable();
    let mut expected = vec![first.as_str(), second.as_str()];
    expected.sort_unstable();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_empty_queue_poll_is_not_found() {
    let service = test_service();
    let (status, body) = get(&service, "/internal/task").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no task available");
}

#[tokio::test]
async fn test_external_worker_round_trip() {
    let service = test_service();
    let id = submit(&service, "6 / 4").await;

    let (status, task) = get(&service, "/internal/task").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["expression_id"], id.as_str());
    assert_eq!(task["arg1"], 6.0);
    assert_eq!(task["arg2"], 4.0);
    assert_eq!(task["operation"], "/");
    assert_eq!(task["operation_time"], 0);

    // The same task is never handed out twice
    let (status, _) = get(&service, "/internal/task").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let task_id = task["id"].as_str().unwrap();
    let (status, body) = post_json(
        &service,
        "/internal/task",
        json!({ "id": task_id, "result": 1.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], task_id);

    let (_, expression) = get(&service, &format!("/api/v1/expressions/{id}")).await;
    assert_eq!(expression["status"], "completed");
    assert_eq!(expression["result"], 1.5);

    // A second report for the same task is refused
    let (status, _) = post_json(
        &service,
        "/internal/task",
        json!({ "id": task_id, "result": 1.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_result_validation() {
    let service = test_service();

    let (status, _) =
        post_json(&service, "/internal/task", json!({ "id": "nope", "result": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &service,
        "/internal/task",
        json!({ "id": uuid::Uuid::new_v4(), "result": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_queue_full_is_service_unavailable() {
    let service = Arc::new(CalculatorService::new(&test_config(1)));
    submit(&service, "1 + 1").await;

    let (status, body) =
        post_json(&service, "/api/v1/calculate", json!({ "expression": "2 + 2" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("full"));
    assert_eq!(service.expressions().len(), 1);
}

#[tokio::test]
async fn test_polled_tasks_free_queue_slots() {
    let service = Arc::new(CalculatorService::new(&test_config(1)));

    // Workers that take a task and never report back
    for expression in ["1 + 1", "2 + 2", "3 + 3"] {
        submit(&service, expression).await;
        let (status, _) = get(&service, "/internal/task").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, health) = get(&service, "/health").await;
    assert_eq!(health["queue_depth"], 0);
    assert_eq!(health["dispatched_tasks"], 3);
    submit(&service, "4 + 4").await;
}

#[tokio::test]
async fn test_cors_preflight() {
    let service = test_service();

    let resp = warp::test::request()
        .method("OPTIONS")
        .path("/api/v1/calculate")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .reply(&api(service.clone()))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = warp::test::request()
        .method("OPTIONS")
        .path("/api/v1/calculate")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "DELETE")
        .reply(&api(service.clone()))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(parse_body(resp.body())["error"].is_string());
}

#[tokio::test]
async fn test_health_endpoint() {
    let service = test_service();
    submit(&service, "(1 + 2) * (3 + 4)").await;

    let (status, body) = get(&service, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["queue_depth"], 2);
    assert_eq!(body["queue_capacity"], 100);
    assert_eq!(body["outstanding_tasks"], 3);
    assert_eq!(body["dispatched_tasks"], 0);
    assert_eq!(body["expressions"], 1);
    assert_eq!(body["metrics"]["expressions_submitted"], 1);
}

#[tokio::test]
async fn test_unknown_route_and_wrong_method() {
    let service = test_service();

    let (status, body) = get(&service, "/api/v2/calculate").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let resp = warp::test::request()
        .method("DELETE")
        .path("/api/v1/expressions")
        .reply(&api(service.clone()))
        .await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(parse_body(resp.body())["error"].is_string());
}
