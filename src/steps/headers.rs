//! Build-phase steps that decorate the wire request

use crate::core::{
    AssemblyError, ClientConfig, ExecutionContext, Next, PipelineError, RelativePosition, Stack,
    Step, StepValue,
};
use crate::transport::Request;
use async_trait::async_trait;
use std::any::type_name;
use uuid::Uuid;

pub const CLIENT_REQUEST_ID_ID: &str = "ClientRequestId";
pub const COMPUTE_CONTENT_LENGTH_ID: &str = "ComputeContentLength";
pub const USER_AGENT_ID: &str = "UserAgent";

pub const INVOCATION_ID_HEADER: &str = "amz-sdk-invocation-id";

pub(crate) fn request_mut<'v>(
    ctx: &ExecutionContext,
    value: &'v mut StepValue,
) -> Result<&'v mut Request, PipelineError> {
    let found = value.type_name();
    value
        .downcast_mut::<Request>()
        .ok_or_else(|| ctx.unexpected(type_name::<Request>(), found))
}

/// Gives every invocation a unique id, shared by all of its attempts
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientRequestId;

#[async_trait]
impl Step for ClientRequestId {
    fn id(&self) -> &str {
        CLIENT_REQUEST_ID_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        mut value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        let invocation_id = Uuid::new_v4().to_string();
        request_mut(ctx, &mut value)?.set_header(INVOCATION_ID_HEADER, invocation_id.clone());
        ctx.metadata.invocation_id = Some(invocation_id);
        next.run(ctx, value).await
    }
}

/// Sets `content-length` from the serialized body
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputeContentLength;

#[async_trait]
impl Step for ComputeContentLength {
    fn id(&self) -> &str {
        COMPUTE_CONTENT_LENGTH_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        mut value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        let request = request_mut(ctx, &mut value)?;
        let length = request.body.len();
        request.set_header("content-length", length.to_string());
        next.run(ctx, value).await
    }
}

/// Sets the `user-agent` header
#[derive(Debug, Clone)]
pub struct UserAgent {
    value: String,
}

impl UserAgent {
    pub fn new(app_id: Option<&str>) -> Self {
        let mut value = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        if let Some(app_id) = app_id {
            value.push_str(" app/");
            value.push_str(app_id);
        }
        Self { value }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[async_trait]
impl Step for UserAgent {
    fn id(&self) -> &str {
        USER_AGENT_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        mut value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        request_mut(ctx, &mut value)?.set_header("user-agent", self.value.clone());
        next.run(ctx, value).await
    }
}

pub fn add_client_request_id(stack: &mut Stack, _config: &ClientConfig) -> Result<(), AssemblyError> {
    stack.build().add(ClientRequestId, RelativePosition::After)
}

pub fn add_compute_content_length(
    stack: &mut Stack,
    _config: &ClientConfig,
) -> Result<(), AssemblyError> {
    stack.build().add(ComputeContentLength, RelativePosition::After)
}

pub fn add_user_agent(stack: &mut Stack, config: &ClientConfig) -> Result<(), AssemblyError> {
    stack
        .build()
        .add(UserAgent::new(config.app_id.as_deref()), RelativePosition::After)
}
