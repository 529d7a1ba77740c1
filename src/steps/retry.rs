//! Retry step - re-invokes the rest of the chain for retryable failures

use crate::core::{
    AssemblyError, ClientConfig, ExecutionContext, Next, PipelineError, RelativePosition,
    RetryConfig, Stack, Step, StepValue,
};
use crate::transport::Request;
use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

pub const RETRY_ID: &str = "Retry";

/// Retries the downstream chain with capped exponential backoff.
///
/// Only a `Request` value can be re-sent; anything else gets a single attempt.
#[derive(Debug, Clone, Copy)]
pub struct Retry {
    config: RetryConfig,
}

impl Retry {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        let millis = self
            .config
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.config.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

#[async_trait]
impl Step for Retry {
    fn id(&self) -> &str {
        RETRY_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        let request = match value.downcast::<Request>() {
            Ok(request) => request,
            Err(value) => {
                debug!(
                    "Retry for {} skipped: value is {}",
                    ctx.operation(),
                    value.type_name()
                );
                return next.run(ctx, value).await;
            }
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match next.run(ctx, StepValue::new(request.clone())).await {
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "{} attempt {}/{} failed: {} (retrying in {:?})",
                        ctx.operation(),
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    let cancel = ctx.cancel_token().clone();
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = cancel.cancelled() => {
                            return Err(ctx.cancelled_before(format!(
                                "retry attempt {}",
                                attempt + 1
                            )));
                        }
                    }
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

pub fn add_retry(stack: &mut Stack, config: &ClientConfig) -> Result<(), AssemblyError> {
    stack
        .finalize()
        .add(Retry::new(config.retry), RelativePosition::After)
}
