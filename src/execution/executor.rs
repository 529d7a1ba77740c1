//! Pipeline executor - assembles a stack once and runs it per call

use crate::core::{
    AssemblyError, CancelToken, ClientConfig, ExecutionContext, Handler, IdentityHandler,
    Metadata, Next, PipelineError, PlannedStep, Registrar, Stack, StepEntry, StepValue,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// An assembled, reusable operation pipeline
#[derive(Clone)]
pub struct Pipeline {
    operation: String,
    plan: Vec<PlannedStep>,
    entries: Arc<[StepEntry]>,
    handler: Arc<dyn Handler>,
}

impl Pipeline {
    /// Run every registrar, in order, against an empty stack
    pub fn assemble(
        operation: impl Into<String>,
        registrars: &[Arc<dyn Registrar>],
        config: &ClientConfig,
    ) -> Result<Self, AssemblyError> {
        let operation = operation.into();
        if operation.trim().is_empty() {
            return Err(AssemblyError::EmptyOperationName);
        }

        let mut stack = Stack::new(operation.clone());
        for registrar in registrars {
            registrar.register(&mut stack, config)?;
        }
        debug!("Assembled {} with {} steps", operation, stack.len());

        Ok(Self::from_stack(stack))
    }

    /// Freeze an already populated stack
    pub fn from_stack(stack: Stack) -> Self {
        Self {
            operation: stack.operation().to_string(),
            plan: stack.plan(),
            entries: stack.into_entries().into(),
            handler: Arc::new(IdentityHandler),
        }
    }

    /// Replace the terminal handler (identity by default)
    pub fn with_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Steps in execution order
    pub fn plan(&self) -> &[PlannedStep] {
        &self.plan
    }

    /// Execute the pipeline with a fresh execution context.
    ///
    /// Errors from steps are returned exactly as the step produced them.
    pub async fn execute(
        &self,
        input: StepValue,
        cancel: CancelToken,
    ) -> Result<(StepValue, Metadata), PipelineError> {
        let mut ctx = ExecutionContext::new(&self.operation, cancel);
        ctx.metadata.started_at = Some(Utc::now());
        let started = Instant::now();

        debug!("Executing {} ({} steps)", self.operation, self.entries.len());
        let result = Next::new(&self.entries, self.handler.as_ref())
            .run(&mut ctx, input)
            .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        ctx.metadata.elapsed_ms = Some(elapsed_ms);

        match result {
            Ok(value) => {
                info!(
                    "{} completed in {}ms ({} attempt(s))",
                    self.operation, elapsed_ms, ctx.metadata.attempts
                );
                Ok((value, ctx.into_metadata()))
            }
            Err(e) => {
                warn!("{} failed after {}ms: {}", self.operation, elapsed_ms, e);
                Err(e)
            }
        }
    }
}

/// Assemble and run a pipeline in one call, with the identity handler
pub async fn execute(
    operation: &str,
    input: StepValue,
    registrars: &[Arc<dyn Registrar>],
    config: &ClientConfig,
) -> Result<(StepValue, Metadata), PipelineError> {
    let pipeline =
        Pipeline::assemble(operation, registrars, config).map_err(|source| {
            PipelineError::Assembly {
                operation: operation.to_string(),
                source,
            }
        })?;
    pipeline.execute(input, CancelToken::new()).await
}
