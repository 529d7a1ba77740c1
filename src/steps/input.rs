//! Serialize-phase steps: input wrapping and the operation codec

use crate::core::{
    AssemblyError, BoxError, ClientConfig, ExecutionContext, Next, PipelineError,
    RelativePosition, Stack, Step, StepValue,
};
use crate::transport::{Request, Response};
use async_trait::async_trait;
use std::any::type_name;
use std::sync::Arc;

pub const SET_OPERATION_INPUT_ID: &str = "SetOperationInput";
pub const OPERATION_SERIALIZER_ID: &str = "OperationSerializer";
pub const OPERATION_DESERIALIZER_ID: &str = "OperationDeserializer";

/// Writes an operation input into a wire request
pub type SerializeFn<I> = Arc<dyn Fn(&I, &mut Request) -> Result<(), BoxError> + Send + Sync>;

/// Reads an operation output from a wire response
pub type DeserializeFn<O> = Arc<dyn Fn(Response) -> Result<O, BoxError> + Send + Sync>;

/// Operation input paired with the request it will be written into
#[derive(Debug)]
pub struct SerializeInput {
    pub parameters: StepValue,
    pub request: Request,
}

/// Pairs the caller's input with an empty wire request
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOperationInput;

#[async_trait]
impl Step for SetOperationInput {
    fn id(&self) -> &str {
        SET_OPERATION_INPUT_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        let input = SerializeInput {
            parameters: value,
            request: Request::new(ctx.operation()),
        };
        next.run(ctx, StepValue::new(input)).await
    }
}

/// Runs the operation-specific serializer
pub struct OperationSerializer<I> {
    serialize: SerializeFn<I>,
}

impl<I> OperationSerializer<I> {
    pub fn new(serialize: SerializeFn<I>) -> Self {
        Self { serialize }
    }
}

#[async_trait]
impl<I: Send + Sync + 'static> Step for OperationSerializer<I> {
    fn id(&self) -> &str {
        OPERATION_SERIALIZER_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        let SerializeInput {
            parameters,
            mut request,
        } = value
            .downcast::<SerializeInput>()
            .map_err(|v| ctx.unexpected(type_name::<SerializeInput>(), v.type_name()))?;

        {
            let input = parameters
                .downcast_ref::<I>()
                .ok_or_else(|| ctx.unexpected(type_name::<I>(), parameters.type_name()))?;
            (self.serialize)(input, &mut request).map_err(|e| ctx.fail(e))?;
        }

        next.run(ctx, StepValue::new(request)).await
    }
}

/// Runs the operation-specific deserializer on the way back
pub struct OperationDeserializer<O> {
    deserialize: DeserializeFn<O>,
}

impl<O> OperationDeserializer<O> {
    pub fn new(deserialize: DeserializeFn<O>) -> Self {
        Self { deserialize }
    }
}

#[async_trait]
impl<O: Send + 'static> Step for OperationDeserializer<O> {
    fn id(&self) -> &str {
        OPERATION_DESERIALIZER_ID
    }

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError> {
        let response = next
            .run(ctx, value)
            .await?
            .downcast::<Response>()
            .map_err(|v| ctx.unexpected(type_name::<Response>(), v.type_name()))?;

        let output = (self.deserialize)(response).map_err(|e| ctx.fail(e))?;
        Ok(StepValue::new(output))
    }
}

pub fn add_set_operation_input(stack: &mut Stack, _config: &ClientConfig) -> Result<(), AssemblyError> {
    stack.serialize().add(SetOperationInput, RelativePosition::After)
}

/// Registrar for an operation's serializer
pub fn serializer_registrar<I: Send + Sync + 'static>(
    serialize: SerializeFn<I>,
) -> impl Fn(&mut Stack, &ClientConfig) -> Result<(), AssemblyError> + Send + Sync {
    move |stack: &mut Stack, _config: &ClientConfig| {
        stack
            .serialize()
            .add(OperationSerializer::new(serialize.clone()), RelativePosition::After)
    }
}

/// Registrar for an operation's deserializer
pub fn deserializer_registrar<O: Send + 'static>(
    deserialize: DeserializeFn<O>,
) -> impl Fn(&mut Stack, &ClientConfig) -> Result<(), AssemblyError> + Send + Sync {
    move |stack: &mut Stack, _config: &ClientConfig| {
        stack
            .deserialize()
            .add(OperationDeserializer::new(deserialize.clone()), RelativePosition::After)
    }
}
