//! Wire request/response envelopes and transport errors

use std::collections::BTreeMap;
use thiserror::Error;

/// Error types for transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connect(String),

    #[error("timeout after {0} seconds")]
    Timeout(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

/// An outgoing wire request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Operation the request was built for
    pub operation: String,

    /// Resolved endpoint, set during serialize
    pub endpoint: Option<String>,

    /// Headers, keyed by lowercase name
    pub headers: BTreeMap<String, String>,

    /// Serialized payload
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// An incoming wire response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,

    /// Headers, keyed by lowercase name
    pub headers: BTreeMap<String, String>,

    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
