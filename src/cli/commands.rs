//! CLI command definitions

use crate::core::{ClientConfig, Override};
use anyhow::{Context, Result};
use clap::Args;

/// Operation and client selection shared by `invoke` and `plan`
#[derive(Debug, Args, Clone)]
pub struct TargetArgs {
    /// Operation name
    #[arg(short, long)]
    pub operation: String,

    /// Path to client configuration YAML file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Service id used when no configuration file is given
    #[arg(long, default_value = "Loopback")]
    pub service_id: String,

    /// Region override
    #[arg(long)]
    pub region: Option<String>,

    /// Endpoint override
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Maximum attempts override
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

impl TargetArgs {
    /// Load the configuration file, or build one from the service id
    pub fn client_config(&self) -> Result<ClientConfig> {
        match &self.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("Failed to load client config from {}", path)),
            None => {
                let config = ClientConfig::new(self.service_id.clone());
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Per-call overrides from the command line
    pub fn overrides(&self) -> Vec<Override> {
        let mut overrides = Vec::new();
        if let Some(region) = &self.region {
            overrides.push(Override::Region(region.clone()));
        }
        if let Some(endpoint) = &self.endpoint {
            overrides.push(Override::Endpoint(endpoint.clone()));
        }
        if let Some(attempts) = self.max_attempts {
            overrides.push(Override::MaxAttempts(attempts));
        }
        overrides
    }
}

/// Invoke an operation
#[derive(Debug, Args, Clone)]
pub struct InvokeCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Operation input as JSON (omit for the default input)
    #[arg(short, long)]
    pub input: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl InvokeCommand {
    pub fn parse_input(&self) -> Result<Option<serde_json::Value>> {
        self.input
            .as_deref()
            .map(|raw| serde_json::from_str(raw).context("Input is not valid JSON"))
            .transpose()
    }
}

/// Show the assembled step order
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validate a client configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to client configuration YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
