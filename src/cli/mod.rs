//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{InvokeCommand, PlanCommand, ValidateCommand};
use std::ffi::OsString;

/// Run operation calls through the middleware pipeline
#[derive(Debug, Parser, Clone)]
#[command(name = "opstack")]
#[command(version)]
#[command(about = "Execute operation calls through a phase-ordered middleware pipeline", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Invoke an operation against the loopback transport
    Invoke(InvokeCommand),

    /// Show the step order an operation would run
    Plan(PlanCommand),

    /// Validate a client configuration file
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
