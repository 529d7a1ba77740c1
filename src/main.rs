use anyhow::{Context, Result};
use opstack::cli::commands::{InvokeCommand, PlanCommand, ValidateCommand};
use opstack::cli::output::*;
use opstack::cli::{Cli, Command};
use opstack::{Client, ClientConfig, LoopbackTransport, OperationSpec};
use serde_json::Value;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Invoke(cmd) => invoke_operation(cmd).await?,
        Command::Plan(cmd) => show_plan(cmd)?,
        Command::Validate(cmd) => validate_config(cmd)?,
    }

    Ok(())
}

async fn invoke_operation(cmd: &InvokeCommand) -> Result<()> {
    let config = cmd.target.client_config()?;
    let input = cmd.parse_input()?;
    let client = Client::new(config, Arc::new(LoopbackTransport::new()));
    let operation = OperationSpec::<Value, Value>::json(cmd.target.operation.clone());

    println!(
        "{} Invoking {}",
        INFO,
        style(operation.name()).bold()
    );

    match client
        .invoke(&operation, input, &cmd.target.overrides())
        .await
    {
        Ok(output) => {
            if cmd.json {
                let data = serde_json::json!({
                    "output": output.value,
                    "metadata": output.metadata,
                });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!(
                    "{} {} completed {}",
                    CHECK,
                    style(operation.name()).bold(),
                    style("successfully").green()
                );
                println!("{}", format_metadata(&output.metadata));
                println!("\n{}", serde_json::to_string_pretty(&output.value)?);
            }
            Ok(())
        }
        Err(e) => {
            println!("{}", format_error(&e));
            std::process::exit(1);
        }
    }
}

fn show_plan(cmd: &PlanCommand) -> Result<()> {
    let config = cmd.target.client_config()?;
    let client = Client::new(config, Arc::new(LoopbackTransport::new()));
    let operation = OperationSpec::<Value, Value>::json(cmd.target.operation.clone());

    let plan = client.plan(&operation, &cmd.target.overrides())?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!(
            "{} {} runs {} steps:",
            INFO,
            style(operation.name()).bold(),
            style(plan.len()).cyan()
        );
        print!("{}", format_plan(&plan));
    }
    Ok(())
}

fn validate_config(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating client configuration...", INFO);

    match ClientConfig::from_file(&cmd.file) {
        Ok(config) => {
            println!("{} Configuration is valid!", CHECK);
            println!("  Service: {}", style(&config.service_id).bold());
            println!("  Region: {}", style(&config.region).cyan());
            println!("  Endpoint: {}", style(config.resolve_endpoint()).dim());
            println!("  Max attempts: {}", style(config.retry.max_attempts).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}
