//! Client configuration from YAML

use crate::core::stack::Registrar;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Default endpoint template; `{service}` and `{region}` are substituted
pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "https://{service}.{region}.amazonaws.com";

/// Client configuration, passed explicitly at client construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Service identifier stamped into every call's metadata
    pub service_id: String,

    /// Region calls are made against
    #[serde(default = "default_region")]
    pub region: String,

    /// Fixed endpoint (overrides the template)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Endpoint template used when no fixed endpoint is set
    #[serde(default = "default_endpoint_template")]
    pub endpoint_template: String,

    /// Use plain http for resolved endpoints
    #[serde(default)]
    pub disable_https: bool,

    /// Application id appended to the user agent
    #[serde(default)]
    pub app_id: Option<String>,

    /// Retry behavior
    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-attempt transport timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Log each request and response at debug level
    #[serde(default)]
    pub log_requests: bool,
}

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry (in milliseconds)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound for the backoff (in milliseconds)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_endpoint_template() -> String {
    DEFAULT_ENDPOINT_TEMPLATE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    50
}

fn default_max_backoff_ms() -> u64 {
    2_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl ClientConfig {
    /// Configuration with defaults for everything but the service id
    pub fn new(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            region: default_region(),
            endpoint: None,
            endpoint_template: default_endpoint_template(),
            disable_https: false,
            app_id: None,
            retry: RetryConfig::default(),
            timeout_secs: default_timeout_secs(),
            log_requests: false,
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.service_id.trim().is_empty() {
            anyhow::bail!("service_id must not be empty");
        }
        if self.region.trim().is_empty() {
            anyhow::bail!("region must not be empty");
        }
        if matches!(&self.endpoint, Some(endpoint) if endpoint.trim().is_empty()) {
            anyhow::bail!("endpoint must not be empty when set");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            anyhow::bail!(
                "retry.initial_backoff_ms ({}) exceeds retry.max_backoff_ms ({})",
                self.retry.initial_backoff_ms,
                self.retry.max_backoff_ms
            );
        }
        if self.endpoint.is_none() && !self.endpoint_template.contains("{service}") {
            anyhow::bail!("endpoint_template must contain {{service}}");
        }
        Ok(())
    }

    /// Copy of this configuration with per-call overrides applied
    pub fn with_overrides(&self, overrides: &[Override]) -> Self {
        let mut config = self.clone();
        for o in overrides {
            match o {
                Override::Region(region) => config.region = region.clone(),
                Override::Endpoint(endpoint) => config.endpoint = Some(endpoint.clone()),
                Override::MaxAttempts(attempts) => config.retry.max_attempts = (*attempts).max(1),
                Override::Registrar(_) => {}
            }
        }
        config
    }

    /// Endpoint a request should be sent to
    pub fn resolve_endpoint(&self) -> String {
        let endpoint = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => self
                .endpoint_template
                .replace("{service}", &endpoint_label(&self.service_id))
                .replace("{region}", &self.region),
        };

        if self.disable_https {
            if let Some(rest) = endpoint.strip_prefix("https://") {
                return format!("http://{}", rest);
            }
        }
        endpoint
    }
}

/// Lowercase, hyphenated form of a service id
fn endpoint_label(service_id: &str) -> String {
    service_id
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Per-call configuration override, applied before the pipeline is assembled
#[derive(Clone)]
pub enum Override {
    Region(String),
    Endpoint(String),
    MaxAttempts(u32),
    /// Extra registrar run after the client's own registrars
    Registrar(Arc<dyn Registrar>),
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Override::Region(region) => f.debug_tuple("Region").field(region).finish(),
            Override::Endpoint(endpoint) => f.debug_tuple("Endpoint").field(endpoint).finish(),
            Override::MaxAttempts(n) => f.debug_tuple("MaxAttempts").field(n).finish(),
            Override::Registrar(_) => f.write_str("Registrar(..)"),
        }
    }
}
