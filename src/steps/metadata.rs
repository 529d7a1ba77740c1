//! Service metadata step

use crate::core::{
    AssemblyError, ClientConfig, ExecutionContext, Next, PipelineError, RelativePosition, Stack,
    Step, StepValue,
};
use async_trait::async_trait;

pub const SERVICE_METADATA_ID: &str = "RegisterServiceMetadata";

/// Stamps the service id, operation name, and region into the context
#[derive(Debug, Clone)]
pub struct RegisterServiceMetadata {
    pub service_id: String,
    pub operation: String,
    pub region: String,
}

#[async_trait]
impl Step for RegisterServiceMetadata {
    fn id(&self) -> &str {
        SERVICE_METADATA_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        ctx.metadata.service_id = Some(self.service_id.clone());
        ctx.metadata.operation = Some(self.operation.clone());
        ctx.metadata.region = Some(self.region.clone());
        next.run(ctx, value).await
    }
}

/// Register at the front of the initialize phase
pub fn add_service_metadata(stack: &mut Stack, config: &ClientConfig) -> Result<(), AssemblyError> {
    let step = RegisterServiceMetadata {
        service_id: config.service_id.clone(),
        operation: stack.operation().to_string(),
        region: config.region.clone(),
    };
    stack.initialize().add(step, RelativePosition::Before)
}
