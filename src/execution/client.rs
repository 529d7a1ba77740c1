//! Client - the caller-facing entry point for operation calls

use crate::core::{
    AssemblyError, CancelToken, ClientConfig, Metadata, Override, PipelineError, PlannedStep,
    Registrar, StepValue,
};
use crate::execution::{executor::Pipeline, operation::OperationSpec};
use crate::steps::standard_registrars;
use crate::transport::{Transport, TransportHandler};
use std::any::type_name;
use std::sync::Arc;
use tracing::info;

/// Output of a successful operation call
#[derive(Debug, Clone)]
pub struct Output<O> {
    pub value: O,
    pub metadata: Metadata,
}

/// Operation client
///
/// Holds the configuration and transport shared by all calls. Each call
/// assembles its own pipeline from the operation's registrars, the standard
/// registrars, client-level registrars, and any per-call override registrars.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    registrars: Vec<Arc<dyn Registrar>>,
}

impl Client {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            registrars: Vec::new(),
        }
    }

    /// Add a registrar applied to every call made through this client
    pub fn with_registrar(mut self, registrar: Arc<dyn Registrar>) -> Self {
        self.registrars.push(registrar);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Invoke an operation. A `None` input is replaced by `I::default()`.
    pub async fn invoke<I, O>(
        &self,
        operation: &OperationSpec<I, O>,
        input: Option<I>,
        overrides: &[Override],
    ) -> Result<Output<O>, PipelineError>
    where
        I: Default + Send + Sync + 'static,
        O: Send + 'static,
    {
        self.invoke_with_cancel(operation, input, overrides, CancelToken::new())
            .await
    }

    /// Invoke an operation that can be cancelled through `cancel`
    pub async fn invoke_with_cancel<I, O>(
        &self,
        operation: &OperationSpec<I, O>,
        input: Option<I>,
        overrides: &[Override],
        cancel: CancelToken,
    ) -> Result<Output<O>, PipelineError>
    where
        I: Default + Send + Sync + 'static,
        O: Send + 'static,
    {
        let config = self.call_config(operation.name(), overrides)?;
        let pipeline = self.assemble(operation, &config, overrides)?;

        info!("Invoking {} in {}", operation.name(), config.region);
        let input = StepValue::new(input.unwrap_or_default());
        let (value, metadata) = pipeline.execute(input, cancel).await?;

        let value = value
            .downcast::<O>()
            .map_err(|v| PipelineError::UnexpectedValue {
                operation: operation.name().to_string(),
                expected: type_name::<O>(),
                found: v.type_name(),
            })?;

        Ok(Output { value, metadata })
    }

    /// The step order a call would run, without running it
    pub fn plan<I, O>(
        &self,
        operation: &OperationSpec<I, O>,
        overrides: &[Override],
    ) -> Result<Vec<PlannedStep>, PipelineError>
    where
        I: Send + Sync + 'static,
        O: Send + 'static,
    {
        let config = self.call_config(operation.name(), overrides)?;
        let pipeline = self.assemble(operation, &config, overrides)?;
        Ok(pipeline.plan().to_vec())
    }

    /// Client configuration with the call's overrides applied and validated
    fn call_config(
        &self,
        operation: &str,
        overrides: &[Override],
    ) -> Result<ClientConfig, PipelineError> {
        let config = self.config.with_overrides(overrides);
        config
            .validate()
            .map_err(|e| PipelineError::Assembly {
                operation: operation.to_string(),
                source: AssemblyError::InvalidConfig {
                    reason: e.to_string(),
                },
            })?;
        Ok(config)
    }

    fn assemble<I, O>(
        &self,
        operation: &OperationSpec<I, O>,
        config: &ClientConfig,
        overrides: &[Override],
    ) -> Result<Pipeline, PipelineError>
    where
        I: Send + Sync + 'static,
        O: Send + 'static,
    {
        let mut registrars = operation.registrars();
        registrars.extend(standard_registrars());
        registrars.extend(self.registrars.iter().cloned());
        registrars.extend(overrides.iter().filter_map(|o| match o {
            Override::Registrar(r) => Some(r.clone()),
            _ => None,
        }));

        let handler = TransportHandler::new(self.transport.clone(), config.timeout_secs);
        Pipeline::assemble(operation.name(), &registrars, config)
            .map(|pipeline| pipeline.with_handler(Arc::new(handler)))
            .map_err(|source| PipelineError::Assembly {
                operation: operation.name().to_string(),
                source,
            })
    }
}
