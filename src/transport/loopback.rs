//! In-process transport that answers every request itself

use crate::transport::{Request, Response, Transport, TransportError};
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

/// Transport that echoes the request body back with status 200.
///
/// Every response carries a fresh `x-amzn-requestid` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackTransport;

impl LoopbackTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        debug!(
            "Loopback {} ({} bytes) -> {}",
            request.operation,
            request.body.len(),
            request.endpoint.as_deref().unwrap_or("<no endpoint>")
        );

        let mut response = Response::new(200, request.body)
            .with_header("x-amzn-requestid", Uuid::new_v4().to_string());
        if let Some(content_type) = request.headers.get("content-type") {
            response = response.with_header("content-type", content_type.clone());
        }
        Ok(response)
    }
}
