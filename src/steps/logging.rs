//! Request/response logging

use crate::core::{
    AssemblyError, ClientConfig, ExecutionContext, Next, PipelineError, RelativePosition, Stack,
    Step, StepValue,
};
use crate::steps::retry::RETRY_ID;
use crate::transport::{Request, Response};
use async_trait::async_trait;
use tracing::debug;

pub const REQUEST_RESPONSE_LOGGING_ID: &str = "RequestResponseLogging";

/// Logs each attempt's request and response at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestResponseLogging;

#[async_trait]
impl Step for RequestResponseLogging {
    fn id(&self) -> &str {
        REQUEST_RESPONSE_LOGGING_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        if let Some(request) = value.downcast_ref::<Request>() {
            debug!(
                "Request {} -> {}: headers={:?} body={}",
                request.operation,
                request.endpoint.as_deref().unwrap_or("<unresolved>"),
                request.headers,
                String::from_utf8_lossy(&request.body)
            );
        }

        let result = next.run(ctx, value).await;

        match &result {
            Ok(value) => {
                if let Some(response) = value.downcast_ref::<Response>() {
                    debug!(
                        "Response {}: status={} headers={:?} body={}",
                        ctx.operation(),
                        response.status,
                        response.headers,
                        String::from_utf8_lossy(&response.body)
                    );
                }
            }
            Err(e) => debug!("Response {}: error: {}", ctx.operation(), e),
        }
        result
    }
}

/// Register after the retry step so every attempt is logged.
///
/// Does nothing unless `log_requests` is set.
pub fn add_request_logging(stack: &mut Stack, config: &ClientConfig) -> Result<(), AssemblyError> {
    if !config.log_requests {
        return Ok(());
    }
    let mut finalize = stack.finalize();
    if finalize.get(RETRY_ID).is_some() {
        finalize.insert(RequestResponseLogging, RETRY_ID, RelativePosition::After)
    } else {
        finalize.add(RequestResponseLogging, RelativePosition::After)
    }
}
