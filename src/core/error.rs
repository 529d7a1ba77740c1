//! Error types for pipeline assembly and execution

use crate::core::phase::Phase;
use crate::transport::TransportError;
use thiserror::Error;

/// Boxed cause carried by step failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering steps into a stack.
///
/// These surface before any step runs.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("step '{id}' is already registered in the {phase} phase")]
    DuplicateStep { id: String, phase: Phase },

    #[error("anchor step '{anchor}' not found in the {phase} phase")]
    UnknownAnchor { anchor: String, phase: Phase },

    #[error("step '{id}' not found")]
    StepNotFound { id: String },

    #[error("operation name must not be empty")]
    EmptyOperationName,

    #[error("invalid client configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Errors returned by an operation call
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{operation}: failed to assemble pipeline: {source}")]
    Assembly {
        operation: String,
        #[source]
        source: AssemblyError,
    },

    #[error("{operation}: {phase} step '{step}' failed: {source}")]
    Step {
        operation: String,
        phase: Phase,
        step: String,
        #[source]
        source: BoxError,
    },

    #[error("{operation}: cancelled before {boundary}")]
    Cancelled { operation: String, boundary: String },

    /// Failure raised by the terminal handler itself, after the last step
    #[error("{operation}: handler failed: {source}")]
    Handler {
        operation: String,
        #[source]
        source: BoxError,
    },

    /// The transport could not deliver the request. Raised by the terminal
    /// handler, so it has no phase of its own.
    #[error("{operation}: transport failure: {source}")]
    Transport {
        operation: String,
        #[source]
        source: TransportError,
    },

    #[error("{operation}: service returned status {status}: {message}")]
    Service {
        operation: String,
        /// Phase of the step that classified the response
        phase: Phase,
        status: u16,
        request_id: Option<String>,
        message: String,
    },

    #[error("{operation}: expected {expected} but the pipeline carried {found}")]
    UnexpectedValue {
        operation: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl PipelineError {
    /// Name of the operation the error belongs to
    pub fn operation(&self) -> &str {
        match self {
            PipelineError::Assembly { operation, .. }
            | PipelineError::Step { operation, .. }
            | PipelineError::Handler { operation, .. }
            | PipelineError::Cancelled { operation, .. }
            | PipelineError::Transport { operation, .. }
            | PipelineError::Service { operation, .. }
            | PipelineError::UnexpectedValue { operation, .. } => operation,
        }
    }

    /// True when the call did not complete because it was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled { .. })
    }

    /// Whether re-sending the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Transport { .. } => true,
            PipelineError::Service { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
