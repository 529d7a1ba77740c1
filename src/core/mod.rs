//! Core domain models for the operation pipeline
//!
//! This module defines phases, steps, the step stack, the per-call execution
//! context, configuration, and error types.

pub mod config;
pub mod context;
pub mod error;
pub mod phase;
pub mod stack;
pub mod step;
pub mod value;

pub use config::{ClientConfig, Override, RetryConfig};
pub use context::{CancelToken, Cursor, ExecutionContext, Metadata};
pub use error::{AssemblyError, BoxError, PipelineError};
pub use phase::{Phase, RelativePosition};
pub use stack::{registrar, PhaseMut, PlannedStep, Registrar, Stack, StepGroup};
pub use step::{BoxFuture, Handler, IdentityHandler, Next, Step, StepEntry};
pub use value::StepValue;
