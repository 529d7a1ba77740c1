//! Test: Retry Behavior - transient failures are re-sent from finalize

use crate::helpers::*;
use opstack::core::{Override, Phase, PipelineError};
use opstack::transport::{Response, TransportError};
use opstack::{Client, OperationSpec};
use serde_json::{json, Value};
use std::sync::Arc;

fn query_lists() -> OperationSpec<Value, Value> {
    OperationSpec::json("QueryLists")
}

/// Retries until the service answers, counting every attempt
#[tokio::test]
async fn test_retries_until_success() {
    let transport = Arc::new(MockTransport::new(vec![
        Ok(Response::new(503, "Service Unavailable")),
        Ok(Response::new(503, "Service Unavailable")),
        Ok(Response::new(200, r#"{"ok":true}"#)),
    ]));
    let client = Client::new(fast_config("Query Protocol"), transport.clone());

    let out = client.invoke(&query_lists(), None, &[]).await.unwrap();

    assert_eq!(out.value, json!({"ok": true}));
    assert_eq!(out.metadata.attempts, 3);
    assert_eq!(out.metadata.retry_count(), 2);
    assert_eq!(transport.send_count(), 3);
}

/// Every attempt re-sends the same request, invocation id included
#[tokio::test]
async fn test_attempts_share_one_request() {
    let transport = Arc::new(MockTransport::new(vec![
        Err(TransportError::Connect("connection reset".to_string())),
        Ok(Response::new(200, "{}")),
    ]));
    let client = Client::new(fast_config("Query Protocol"), transport.clone());

    let out = client
        .invoke(&query_lists(), Some(json!({"ListArg": ["foo"]})), &[])
        .await
        .unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    assert_eq!(
        sent[0].header("amz-sdk-invocation-id"),
        out.metadata.invocation_id.as_deref()
    );
    assert_eq!(out.metadata.attempts, 2);
}

/// Gives up after the configured number of attempts
#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let transport = Arc::new(MockTransport::new(vec![
        Ok(Response::new(500, "boom")),
        Ok(Response::new(500, "boom")),
        Ok(Response::new(200, "{}")),
    ]));
    let client = Client::new(fast_config("Query Protocol"), transport.clone());

    let err = client
        .invoke(&query_lists(), None, &[Override::MaxAttempts(2)])
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Service { status: 500, .. }));
    assert_eq!(transport.send_count(), 2);
}

/// Client errors are final
#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let transport = Arc::new(MockTransport::new(vec![
        Ok(Response::new(403, "AccessDenied")),
        Ok(Response::new(200, "{}")),
    ]));
    let client = Client::new(fast_config("Query Protocol"), transport.clone());

    let err = client.invoke(&query_lists(), None, &[]).await.unwrap_err();

    assert!(matches!(err, PipelineError::Service { status: 403, .. }));
    assert!(!err.is_retryable());
    assert_eq!(transport.send_count(), 1);
}

/// Steps before the retry step run once per call, steps after it once per attempt
#[tokio::test]
async fn test_retry_reruns_only_downstream_steps() {
    let log = ExecutionLog::new();
    let before = RecordingStep::new("BeforeRetry", &log);
    let after = RecordingStep::new("AfterRetry", &log);
    let transport = Arc::new(MockTransport::new(vec![
        Ok(Response::new(429, "Throttled")),
        Ok(Response::new(200, "{}")),
    ]));
    let client = Client::new(fast_config("Query Protocol"), transport)
        .with_registrar(append(Phase::Build, before.clone()))
        .with_registrar(append(Phase::Finalize, after.clone()));

    let out = client.invoke(&query_lists(), None, &[]).await.unwrap();

    assert_eq!(out.metadata.attempts, 2);
    assert_eq!(before.calls(), 1);
    assert_eq!(after.calls(), 2);
}

/// The reported request id belongs to the attempt that produced the result
#[tokio::test]
async fn test_request_id_comes_from_last_attempt() {
    let transport = Arc::new(MockTransport::new(vec![
        Ok(Response::new(503, "busy").with_header("x-amzn-requestid", "req-attempt-1")),
        Ok(Response::new(200, "{}")),
    ]));
    let client = Client::new(fast_config("Query Protocol"), transport);

    let out = client.invoke(&query_lists(), None, &[]).await.unwrap();

    assert_eq!(out.metadata.attempts, 2);
    assert_eq!(out.metadata.request_id, None);
    assert_eq!(out.metadata.get("http.status"), Some("200"));
    assert_eq!(out.metadata.get("http.header.x-amzn-requestid"), None);
}

/// A final service error carries the id of the attempt that failed
#[tokio::test]
async fn test_service_error_reports_failing_attempt_id() {
    let transport = Arc::new(MockTransport::new(vec![
        Ok(Response::new(503, "busy").with_header("x-amzn-requestid", "req-attempt-1")),
        Ok(Response::new(500, "boom")),
    ]));
    let client = Client::new(fast_config("Query Protocol"), transport);

    let err = client
        .invoke(&query_lists(), None, &[Override::MaxAttempts(2)])
        .await
        .unwrap_err();

    match err {
        PipelineError::Service {
            status, request_id, ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(request_id, None);
        }
        other => panic!("expected a service error, got {other:?}"),
    }
}
