//! Execution context - per-call state shared by the steps of one invocation

use crate::core::{
    error::{BoxError, PipelineError},
    phase::Phase,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Metadata accumulated while an operation call runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Service identifier stamped during initialize
    pub service_id: Option<String>,

    /// Operation name stamped during initialize
    pub operation: Option<String>,

    /// Region the call was made against
    pub region: Option<String>,

    /// Client-generated id for this invocation
    pub invocation_id: Option<String>,

    /// Request id reported by the service
    pub request_id: Option<String>,

    /// Number of times the terminal handler was reached
    pub attempts: u32,

    /// When the pipeline started executing
    pub started_at: Option<DateTime<Utc>>,

    /// When the last response was received
    pub response_at: Option<DateTime<Utc>>,

    /// Wall time of the whole call in milliseconds
    pub elapsed_ms: Option<u64>,

    /// Free-form values set by custom steps
    pub values: BTreeMap<String, String>,
}

impl Metadata {
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Retries performed beyond the first attempt
    pub fn retry_count(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Cancellation signal shared between a caller and an in-flight call
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel is not missed
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// The step currently executing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub phase: Phase,
    pub step: String,
}

/// Execution context for one operation call
///
/// Owned exclusively by the call; dropped when the call returns.
#[derive(Debug)]
pub struct ExecutionContext {
    operation: String,
    cursor: Option<Cursor>,
    cancel: CancelToken,

    /// Metadata handed back to the caller on success
    pub metadata: Metadata,
}

impl ExecutionContext {
    pub fn new(operation: impl Into<String>, cancel: CancelToken) -> Self {
        Self {
            operation: operation.into(),
            cursor: None,
            cancel,
            metadata: Metadata::default(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Phase and id of the step currently running, `None` inside the handler
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Build a step failure attributed to the current cursor.
    ///
    /// Outside any step (inside the terminal handler) the failure is a
    /// `Handler` error. The cause is kept as is in both cases.
    pub fn fail(&self, cause: impl Into<BoxError>) -> PipelineError {
        match &self.cursor {
            Some(cursor) => PipelineError::Step {
                operation: self.operation.clone(),
                phase: cursor.phase,
                step: cursor.step.clone(),
                source: cause.into(),
            },
            None => PipelineError::Handler {
                operation: self.operation.clone(),
                source: cause.into(),
            },
        }
    }

    /// Error for a value of the wrong type at the current cursor
    pub fn unexpected(&self, expected: &'static str, found: &'static str) -> PipelineError {
        PipelineError::UnexpectedValue {
            operation: self.operation.clone(),
            expected,
            found,
        }
    }

    pub(crate) fn cancelled_before(&self, boundary: String) -> PipelineError {
        PipelineError::Cancelled {
            operation: self.operation.clone(),
            boundary,
        }
    }

    pub(crate) fn replace_cursor(&mut self, cursor: Option<Cursor>) -> Option<Cursor> {
        std::mem::replace(&mut self.cursor, cursor)
    }

    pub(crate) fn into_metadata(self) -> Metadata {
        self.metadata
    }
}
