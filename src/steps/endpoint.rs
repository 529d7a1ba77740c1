//! Endpoint resolution

use crate::core::{
    AssemblyError, ClientConfig, ExecutionContext, Next, PipelineError, RelativePosition, Stack,
    Step, StepValue,
};
use crate::steps::input::OPERATION_SERIALIZER_ID;
use crate::transport::Request;
use async_trait::async_trait;
use std::any::type_name;

pub const RESOLVE_ENDPOINT_ID: &str = "ResolveEndpoint";

/// Sets the request endpoint resolved from the client configuration
#[derive(Debug, Clone)]
pub struct ResolveEndpoint {
    endpoint: String,
}

impl ResolveEndpoint {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Step for ResolveEndpoint {
    fn id(&self) -> &str {
        RESOLVE_ENDPOINT_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        mut value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        let found = value.type_name();
        let request = value
            .downcast_mut::<Request>()
            .ok_or_else(|| ctx.unexpected(type_name::<Request>(), found))?;
        request.endpoint = Some(self.endpoint.clone());
        ctx.metadata.set("endpoint", self.endpoint.clone());

        next.run(ctx, value).await
    }
}

/// Register right after the operation serializer
pub fn add_resolve_endpoint(stack: &mut Stack, config: &ClientConfig) -> Result<(), AssemblyError> {
    stack.serialize().insert(
        ResolveEndpoint::new(config.resolve_endpoint()),
        OPERATION_SERIALIZER_ID,
        RelativePosition::After,
    )
}
