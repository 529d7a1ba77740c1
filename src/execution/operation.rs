//! Per-operation configuration data

use crate::core::{BoxError, Registrar};
use crate::steps::{
    add_set_operation_input, deserializer_registrar, serializer_registrar, DeserializeFn,
    SerializeFn,
};
use crate::transport::{Request, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// Everything that distinguishes one operation from another: its name and
/// how its input and output shapes map onto the wire
pub struct OperationSpec<I, O> {
    name: String,
    serialize: SerializeFn<I>,
    deserialize: DeserializeFn<O>,
}

impl<I, O> Clone for OperationSpec<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            serialize: self.serialize.clone(),
            deserialize: self.deserialize.clone(),
        }
    }
}

impl<I, O> OperationSpec<I, O>
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    pub fn new<S, D>(name: impl Into<String>, serialize: S, deserialize: D) -> Self
    where
        S: Fn(&I, &mut Request) -> Result<(), BoxError> + Send + Sync + 'static,
        D: Fn(Response) -> Result<O, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            serialize: Arc::new(serialize),
            deserialize: Arc::new(deserialize),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operation-specific registrars: input wrapping, serializer, deserializer
    pub fn registrars(&self) -> Vec<Arc<dyn Registrar>> {
        vec![
            Arc::new(add_set_operation_input) as Arc<dyn Registrar>,
            Arc::new(serializer_registrar(self.serialize.clone())),
            Arc::new(deserializer_registrar(self.deserialize.clone())),
        ]
    }
}

impl<I, O> OperationSpec<I, O>
where
    I: Serialize + Send + Sync + 'static,
    O: DeserializeOwned + Send + 'static,
{
    /// Operation whose input and output travel as JSON bodies
    pub fn json(name: impl Into<String>) -> Self {
        Self::new(
            name,
            |input: &I, request: &mut Request| {
                request.body = serde_json::to_vec(input)?;
                request.set_header("content-type", "application/json");
                Ok(())
            },
            |response: Response| {
                let body: &[u8] = if response.body.is_empty() {
                    b"{}"
                } else {
                    &response.body
                };
                Ok(serde_json::from_slice(body)?)
            },
        )
    }
}

impl<I, O> std::fmt::Debug for OperationSpec<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
