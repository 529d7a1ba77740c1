//! opstack - a phase-ordered middleware pipeline for remote operation calls

pub mod cli;
pub mod core;
pub mod execution;
pub mod steps;
pub mod transport;

// Re-export commonly used types
pub use core::{
    CancelToken, ClientConfig, ExecutionContext, Metadata, Next, Override, Phase, PipelineError,
    RelativePosition, Stack, Step, StepValue,
};
pub use execution::{Client, OperationSpec, Output, Pipeline};
pub use transport::{LoopbackTransport, Request, Response, Transport, TransportError};
