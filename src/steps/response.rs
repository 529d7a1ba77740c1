//! Deserialize-phase steps that inspect the raw response

use crate::core::{
    AssemblyError, ClientConfig, ExecutionContext, Next, Phase, PipelineError, RelativePosition,
    Stack, Step, StepValue,
};
use crate::steps::input::OPERATION_DESERIALIZER_ID;
use crate::transport::Response;
use async_trait::async_trait;
use chrono::Utc;

pub const RESPONSE_ERROR_HANDLER_ID: &str = "ResponseErrorHandler";
pub const REQUEST_ID_RETRIEVER_ID: &str = "RequestIdRetriever";
pub const RECORD_RESPONSE_TIMING_ID: &str = "RecordResponseTiming";
pub const RAW_RESPONSE_TO_METADATA_ID: &str = "RawResponseToMetadata";

/// Prefix of the metadata keys written by `RawResponseToMetadata`
pub const RAW_RESPONSE_PREFIX: &str = "http.";

/// Response headers that may carry the service's request id
pub const REQUEST_ID_HEADERS: [&str; 2] = ["x-amzn-requestid", "x-amz-request-id"];

const MAX_ERROR_MESSAGE_LEN: usize = 256;

/// Turns non-2xx responses into service errors
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseErrorHandler;

#[async_trait]
impl Step for ResponseErrorHandler {
    fn id(&self) -> &str {
        RESPONSE_ERROR_HANDLER_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        let value = next.run(ctx, value).await?;
        let Some(response) = value.downcast_ref::<Response>() else {
            return Ok(value);
        };
        if response.is_success() {
            return Ok(value);
        }

        let mut message = String::from_utf8_lossy(&response.body).into_owned();
        if message.len() > MAX_ERROR_MESSAGE_LEN {
            let mut end = MAX_ERROR_MESSAGE_LEN;
            while !message.is_char_boundary(end) {
                end -= 1;
            }
            message.truncate(end);
        }

        Err(PipelineError::Service {
            operation: ctx.operation().to_string(),
            phase: ctx.cursor().map_or(Phase::Deserialize, |c| c.phase),
            status: response.status,
            request_id: ctx.metadata.request_id.clone(),
            message,
        })
    }
}

/// Copies the service request id of the latest response into the metadata.
///
/// Each attempt starts without a request id, so a retried call never reports
/// the id of an earlier attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdRetriever;

#[async_trait]
impl Step for RequestIdRetriever {
    fn id(&self) -> &str {
        REQUEST_ID_RETRIEVER_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        ctx.metadata.request_id = None;
        let value = next.run(ctx, value).await?;
        if let Some(response) = value.downcast_ref::<Response>() {
            ctx.metadata.request_id = REQUEST_ID_HEADERS
                .iter()
                .find_map(|h| response.header(h))
                .map(str::to_string);
        }
        Ok(value)
    }
}

/// Stamps when the response arrived
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordResponseTiming;

#[async_trait]
impl Step for RecordResponseTiming {
    fn id(&self) -> &str {
        RECORD_RESPONSE_TIMING_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        let result = next.run(ctx, value).await;
        ctx.metadata.response_at = Some(Utc::now());
        result
    }
}

/// Records the raw response status and headers as `http.*` metadata values
#[derive(Debug, Clone, Copy, Default)]
pub struct RawResponseToMetadata;

#[async_trait]
impl Step for RawResponseToMetadata {
    fn id(&self) -> &str {
        RAW_RESPONSE_TO_METADATA_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        ctx.metadata
            .values
            .retain(|key, _| !key.starts_with(RAW_RESPONSE_PREFIX));

        let value = next.run(ctx, value).await?;
        if let Some(response) = value.downcast_ref::<Response>() {
            ctx.metadata
                .set(format!("{RAW_RESPONSE_PREFIX}status"), response.status.to_string());
            for (name, header) in &response.headers {
                ctx.metadata
                    .set(format!("{RAW_RESPONSE_PREFIX}header.{name}"), header.clone());
            }
        }
        Ok(value)
    }
}

pub fn add_response_error_handler(
    stack: &mut Stack,
    _config: &ClientConfig,
) -> Result<(), AssemblyError> {
    stack.deserialize().insert(
        ResponseErrorHandler,
        OPERATION_DESERIALIZER_ID,
        RelativePosition::After,
    )
}

pub fn add_request_id_retriever(
    stack: &mut Stack,
    _config: &ClientConfig,
) -> Result<(), AssemblyError> {
    stack.deserialize().insert(
        RequestIdRetriever,
        RESPONSE_ERROR_HANDLER_ID,
        RelativePosition::After,
    )
}

pub fn add_record_response_timing(
    stack: &mut Stack,
    _config: &ClientConfig,
) -> Result<(), AssemblyError> {
    stack
        .deserialize()
        .add(RecordResponseTiming, RelativePosition::After)
}

pub fn add_raw_response_to_metadata(
    stack: &mut Stack,
    _config: &ClientConfig,
) -> Result<(), AssemblyError> {
    stack
        .deserialize()
        .add(RawResponseToMetadata, RelativePosition::After)
}
