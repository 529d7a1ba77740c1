//! Step and handler traits, and the `Next` handle that walks the chain

use crate::core::{
    context::{Cursor, ExecutionContext},
    error::PipelineError,
    phase::Phase,
    value::StepValue,
};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A named unit of pipeline work.
///
/// A step receives the value produced by the step before it and a `Next`
/// handle for the rest of the chain. It may transform the value, call `next`
/// (zero, one, or several times), and transform what comes back.
#[async_trait]
pub trait Step: Send + Sync {
    /// Identifier, unique within a stack
    fn id(&self) -> &str;

    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
        next: Next<'_>,
    ) -> Result<StepValue, PipelineError>;
}

/// Terminal handler invoked after the last step
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(
        &self,
        ctx: &mut ExecutionContext,
        value: StepValue,
    ) -> Result<StepValue, PipelineError>;
}

/// Handler that returns the value it receives
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityHandler;

#[async_trait]
impl Handler for IdentityHandler {
    async fn handle(
        &self,
        _ctx: &mut ExecutionContext,
        value: StepValue,
    ) -> Result<StepValue, PipelineError> {
        Ok(value)
    }
}

/// A step placed in its phase
#[derive(Clone)]
pub struct StepEntry {
    pub phase: Phase,
    pub step: Arc<dyn Step>,
}

impl std::fmt::Debug for StepEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepEntry")
            .field("phase", &self.phase)
            .field("step", &self.step.id())
            .finish()
    }
}

/// The remainder of the chain after the current step
#[derive(Clone, Copy)]
pub struct Next<'a> {
    entries: &'a [StepEntry],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub fn new(entries: &'a [StepEntry], handler: &'a dyn Handler) -> Self {
        Self { entries, handler }
    }

    /// Number of steps left before the handler
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }

    /// Run the rest of the chain.
    ///
    /// Cancellation is checked before the next step (or the handler) starts.
    /// The caller's cursor is restored once the rest of the chain returns.
    pub fn run(
        self,
        ctx: &'a mut ExecutionContext,
        value: StepValue,
    ) -> BoxFuture<'a, Result<StepValue, PipelineError>> {
        Box::pin(async move {
            match self.entries.split_first() {
                Some((entry, rest)) => {
                    if ctx.is_cancelled() {
                        return Err(ctx.cancelled_before(format!(
                            "{} step '{}'",
                            entry.phase,
                            entry.step.id()
                        )));
                    }
                    let caller = ctx.replace_cursor(Some(Cursor {
                        phase: entry.phase,
                        step: entry.step.id().to_string(),
                    }));
                    let next = Next {
                        entries: rest,
                        handler: self.handler,
                    };
                    let result = entry.step.handle(&mut *ctx, value, next).await;
                    ctx.replace_cursor(caller);
                    result
                }
                None => {
                    if ctx.is_cancelled() {
                        return Err(ctx.cancelled_before("handler".to_string()));
                    }
                    ctx.metadata.attempts += 1;
                    let caller = ctx.replace_cursor(None);
                    let result = self.handler.handle(&mut *ctx, value).await;
                    ctx.replace_cursor(caller);
                    result
                }
            }
        })
    }
}
