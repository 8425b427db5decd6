//! Agent loop integration tests
//!
//! Agents run as spawned tokio tasks against a shared service and are
//! stopped through the watch-based shutdown signal.


use calc_orchestrator::agent::{spawn_agents, AgentLoop};
use calc_orchestrator::config::ServerConfig;
use calc_orchestrator::evaluation::EvalError;
use calc_orchestrator::testing::ScriptedEvaluator;
use calc_orchestrator::{CalculatorService, ExpressionStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};
use test_helpers::{test_service, wait_for_result};
use tokio::sync::watch;

#[tokio::test]
async fn test_agent_evaluates_nested_expression() {
    let service = test_service();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let agent = tokio::spawn(AgentLoop::new(0, service.clone(), shutdown_rx).run());

    let expr = service.submit("-(2 + 3) * 4 - 10 / 4").unwrap();
    assert_eq!(wait_for_result(&service, &expr.id).await, -22.5);

    shutdown_tx.send(true).unwrap();
    agent.await.unwrap();
    assert_eq!(service.health().outstanding_tasks, 0);
}

#[tokio::test]
async fn test_agent_wakes_for_work_submitted_later() {
    let service = test_service();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let agent = tokio::spawn(AgentLoop::new(0, service.clone(), shutdown_rx).run());

    // Let the agent park on an empty queue first
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    let expr = service.submit("1 + 1").unwrap();
    assert_eq!(wait_for_result(&service, &expr.id).await, 2.0);
    assert!(started.elapsed() < Duration::from_millis(500));

    shutdown_tx.send(true).unwrap();
    assert_eq!(agent.await.unwrap(), 1);
}

#[tokio::test]
async fn test_operation_time_is_honoured() {
    let mut config = ServerConfig::default();
    config.timings.multiplication_ms = 100;
    let service = Arc::new(CalculatorService::new(&config));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let agent = tokio::spawn(AgentLoop::new(0, service.clone(), shutdown_rx).run());

    let started = Instant::now();
    let expr = service.submit("3 * 3").unwrap();
    assert_eq!(wait_for_result(&service, &expr.id).await, 9.0);
    assert!(started.elapsed() >= Duration::from_millis(100));

    shutdown_tx.send(true).unwrap();
    agent.await.unwrap();
}

#[tokio::test]
async fn test_failed_task_does_not_stop_the_loop() {
    // Accept everything so a division by zero reaches the agent
    let evaluator = Arc::new(ScriptedEvaluator::accepting());
    let service = Arc::new(CalculatorService::with_evaluator(
        &ServerConfig::default(),
        evaluator,
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let agent = tokio::spawn(AgentLoop::new(0, service.clone(), shutdown_rx).run());

    let broken = service.submit("1 + 10 / 0").unwrap();
    let fine = service.submit("2 * 21").unwrap();
    assert_eq!(wait_for_result(&service, &fine.id).await, 42.0);

    let stored = service.expression(&broken.id).unwrap();
    assert_eq!(stored.status, ExpressionStatus::Pending);
    assert_eq!(stored.result, None);

    let metrics = service.metrics().snapshot();
    assert_eq!(metrics.tasks_failed, 1);
    assert_eq!(service.health().outstanding_tasks, 0);

    shutdown_tx.send(true).unwrap();
    agent.await.unwrap();
}

#[tokio::test]
async fn test_rejected_submission_never_reaches_agents() {
    let evaluator = Arc::new(ScriptedEvaluator::failing(EvalError::evaluation("rejected")));
    let service = Arc::new(CalculatorService::with_evaluator(
        &ServerConfig::default(),
        evaluator,
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let agents = spawn_agents(2, service.clone(), shutdown_rx);

    assert!(service.submit("1 + 1").is_err());
    tokio::time::sleep(Duration::from_millis(20)).await;

    shutdown_tx.send(true).unwrap();
    let mut processed = 0;
    for agent in agents {
        processed += agent.await.unwrap();
    }
    assert_eq!(processed, 0);
    assert!(service.expressions().is_empty());
}

#[tokio::test]
async fn test_many_agents_complete_many_expressions() {
    let service = test_service();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let agents = spawn_agents(4, service.clone(), shutdown_rx);

    let submitted: Vec<(String, f64)> = (1..=25)
        .map(|n| {
            let expr = service.submit(&format!("({n} + {n}) * {n} - {n}")).unwrap();
            let n = f64::from(n);
            (expr.id, (n + n) * n - n)
        })
        .collect();

    for (id, expected) in &submitted {
        assert_eq!(wait_for_result(&service, id).await, *expected);
    }

    shutdown_tx.send(true).unwrap();
    let mut processed = 0;
    for agent in agents {
        processed += agent.await.unwrap();
    }
    assert_eq!(processed, 25 * 3);
    assert_eq!(service.metrics().snapshot().expressions_completed, 25);
}
