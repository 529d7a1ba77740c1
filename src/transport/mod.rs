//! Transport seam - sends wire requests and returns wire responses

pub mod loopback;
pub mod message;

use crate::core::{ExecutionContext, Handler, PipelineError, StepValue};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{debug, error};

pub use loopback::LoopbackTransport;
pub use message::{Request, Response, TransportError};

/// Trait for sending requests - allows for different implementations
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for its response
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

/// Terminal handler that sends the serialized request through a transport
#[derive(Clone)]
pub struct TransportHandler {
    transport: Arc<dyn Transport>,
    timeout_secs: u64,
}

impl TransportHandler {
    pub fn new(transport: Arc<dyn Transport>, timeout_secs: u64) -> Self {
        Self {
            transport,
            timeout_secs,
        }
    }
}

#[async_trait]
impl Handler for TransportHandler {
    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
    ) -> Result<StepValue, PipelineError> {
        let request = value
            .downcast::<Request>()
            .map_err(|v| ctx.unexpected(std::any::type_name::<Request>(), v.type_name()))?;

        debug!(
            "Sending {} (attempt {})",
            ctx.operation(),
            ctx.metadata.attempts
        );

        let response = match timeout(
            Duration::from_secs(self.timeout_secs),
            self.transport.send(request),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!("Transport error for {}: {}", ctx.operation(), e);
                return Err(PipelineError::Transport {
                    operation: ctx.operation().to_string(),
                    source: e,
                });
            }
            Err(_) => {
                error!(
                    "Timeout for {} after {}s",
                    ctx.operation(),
                    self.timeout_secs
                );
                return Err(PipelineError::Transport {
                    operation: ctx.operation().to_string(),
                    source: TransportError::Timeout(self.timeout_secs),
                });
            }
        };

        Ok(StepValue::new(response))
    }
}
