//! Payload hashing and trace propagation for outgoing requests

use crate::core::{
    AssemblyError, ClientConfig, ExecutionContext, Next, PipelineError, RelativePosition, Stack,
    Step, StepValue,
};
use crate::steps::headers::request_mut;
use async_trait::async_trait;
use percent_encoding::{percent_encode, CONTROLS};
use sha2::{Digest, Sha256};

pub const COMPUTE_PAYLOAD_SHA256_ID: &str = "ComputePayloadSHA256";
pub const RECURSION_DETECTION_ID: &str = "RecursionDetection";

pub const CONTENT_SHA256_HEADER: &str = "x-amz-content-sha256";
pub const TRACE_ID_HEADER: &str = "x-amzn-trace-id";

const LAMBDA_FUNCTION_NAME_ENV: &str = "AWS_LAMBDA_FUNCTION_NAME";
const TRACE_ID_ENV: &str = "_X_AMZN_TRACE_ID";

/// Sets `x-amz-content-sha256` to the hex SHA-256 of the body, unless a
/// caller already provided one
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputePayloadSHA256;

#[async_trait]
impl Step for ComputePayloadSHA256 {
    fn id(&self) -> &str {
        COMPUTE_PAYLOAD_SHA256_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        mut value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        let request = request_mut(ctx, &mut value)?;
        if request.header(CONTENT_SHA256_HEADER).is_none() {
            let digest = hex::encode(Sha256::digest(&request.body));
            request.set_header(CONTENT_SHA256_HEADER, digest);
        }
        next.run(ctx, value).await
    }
}

/// Forwards the Lambda trace id so a service can detect calls that recurse
/// back into the function that made them
#[derive(Debug, Clone, Default)]
pub struct RecursionDetection {
    lambda_function: Option<String>,
    trace_id: Option<String>,
}

impl RecursionDetection {
    pub fn new(lambda_function: Option<String>, trace_id: Option<String>) -> Self {
        Self {
            lambda_function,
            trace_id,
        }
    }

    /// Read the function name and trace id from the process environment
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(LAMBDA_FUNCTION_NAME_ENV).ok(),
            std::env::var(TRACE_ID_ENV).ok(),
        )
    }

    /// Header value to send, if any. Control characters are percent-encoded.
    pub fn trace_header(&self) -> Option<String> {
        match (&self.lambda_function, &self.trace_id) {
            (Some(_), Some(trace_id)) => {
                Some(percent_encode(trace_id.as_bytes(), CONTROLS).to_string())
            }
            _ => None,
        }
    }
}

#[async_trait]
impl Step for RecursionDetection {
    fn id(&self) -> &str {
        RECURSION_DETECTION_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        mut value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        let request = request_mut(ctx, &mut value)?;
        if request.header(TRACE_ID_HEADER).is_none() {
            if let Some(trace) = self.trace_header() {
                request.set_header(TRACE_ID_HEADER, trace);
            }
        }
        next.run(ctx, value).await
    }
}

pub fn add_compute_payload_sha256(
    stack: &mut Stack,
    _config: &ClientConfig,
) -> Result<(), AssemblyError> {
    stack
        .build()
        .add(ComputePayloadSHA256, RelativePosition::After)
}

pub fn add_recursion_detection(
    stack: &mut Stack,
    _config: &ClientConfig,
) -> Result<(), AssemblyError> {
    stack
        .build()
        .add(RecursionDetection::from_env(), RelativePosition::After)
}
