//! Test: Cancellation - checked at every step boundary

use crate::helpers::*;
use async_trait::async_trait;
use opstack::core::{CancelToken, ClientConfig, Phase, PipelineError, RetryConfig, StepValue};
use opstack::execution::Pipeline;
use opstack::transport::{Request, Response, Transport, TransportError};
use opstack::{Client, OperationSpec};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

/// A call cancelled before it starts runs no steps
#[tokio::test]
async fn test_cancelled_before_start_runs_nothing() {
    let log = ExecutionLog::new();
    let validate = RecordingStep::new("Validate", &log);
    let sign = RecordingStep::new("Sign", &log);
    let pipeline = Pipeline::assemble(
        "QueryLists",
        &[
            append(Phase::Initialize, validate.clone()),
            append(Phase::Finalize, sign.clone()),
        ],
        &ClientConfig::new("svc"),
    )
    .unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = pipeline
        .execute(StepValue::new(()), cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(matches!(
        &err,
        PipelineError::Cancelled { boundary, .. } if boundary == "initialize step 'Validate'"
    ));
    assert_eq!(validate.calls(), 0);
    assert_eq!(sign.calls(), 0);
}

/// Cancelling mid-call stops at the next boundary
#[tokio::test]
async fn test_cancel_during_call_stops_at_next_step() {
    let log = ExecutionLog::new();
    let headers = RecordingStep::new("Headers", &log);
    let sign = RecordingStep::new("Sign", &log);
    let pipeline = Pipeline::assemble(
        "QueryLists",
        &[
            append(Phase::Build, headers.clone()),
            append(Phase::Build, CancellingStep::new("Abort")),
            append(Phase::Finalize, sign.clone()),
        ],
        &ClientConfig::new("svc"),
    )
    .unwrap();

    let err = pipeline
        .execute(StepValue::new(()), CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        PipelineError::Cancelled { boundary, .. } if boundary == "finalize step 'Sign'"
    ));
    assert_eq!(headers.calls(), 1);
    assert_eq!(sign.calls(), 0);
}

/// A cancelled call never reaches the transport
#[tokio::test]
async fn test_cancelled_call_sends_nothing() {
    let transport = Arc::new(MockTransport::with_status(200, "{}"));
    let client = Client::new(fast_config("Query Protocol"), transport.clone());
    let op = OperationSpec::<Value, Value>::json("QueryLists");

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = client
        .invoke_with_cancel(&op, None, &[], cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(transport.send_count(), 0);
}

/// Cancelling one call leaves others on the same pipeline untouched
#[tokio::test]
async fn test_cancellation_is_per_call() {
    let log = ExecutionLog::new();
    let pipeline = Pipeline::assemble(
        "QueryLists",
        &[record(Phase::Initialize, "Validate", &log)],
        &ClientConfig::new("svc"),
    )
    .unwrap();

    let cancelled = CancelToken::new();
    cancelled.cancel();
    assert!(pipeline
        .execute(StepValue::new(()), cancelled)
        .await
        .is_err());
    assert!(pipeline
        .execute(StepValue::new(()), CancelToken::new())
        .await
        .is_ok());
    assert_eq!(log.entries(), vec!["Validate"]);
}

/// Answers 503 and cancels the call it is serving
struct CancelOnSend {
    cancel: CancelToken,
    inner: MockTransport,
}

#[async_trait]
impl Transport for CancelOnSend {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        self.cancel.cancel();
        self.inner.send(request).await
    }
}

/// Cancelling during retry backoff ends the call without waiting it out
#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_retry_backoff() {
    let cancel = CancelToken::new();
    let transport = Arc::new(CancelOnSend {
        cancel: cancel.clone(),
        inner: MockTransport::new(vec![
            Ok(Response::new(503, "busy")),
            Ok(Response::new(200, "{}")),
        ]),
    });
    let mut config = ClientConfig::new("Query Protocol");
    config.retry = RetryConfig {
        max_attempts: 3,
        initial_backoff_ms: 30_000,
        max_backoff_ms: 30_000,
    };
    let client = Client::new(config, transport.clone());
    let op = OperationSpec::<Value, Value>::json("QueryLists");

    let started = Instant::now();
    let err = client
        .invoke_with_cancel(&op, None, &[], cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        PipelineError::Cancelled { boundary, .. } if boundary == "retry attempt 2"
    ));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(transport.inner.send_count(), 1);
}
