//! CLI output formatting

use crate::core::{Metadata, Phase, PipelineError, PlannedStep};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");

/// Format a phase name for display
pub fn format_phase(phase: Phase) -> String {
    let name = format!("{:<11}", phase.as_str().to_uppercase());
    match phase {
        Phase::Initialize => style(name).dim().to_string(),
        Phase::Serialize => style(name).cyan().to_string(),
        Phase::Build => style(name).blue().to_string(),
        Phase::Finalize => style(name).yellow().to_string(),
        Phase::Deserialize => style(name).green().to_string(),
    }
}

/// Format an assembled step order, one numbered line per step
pub fn format_plan(plan: &[PlannedStep]) -> String {
    plan.iter()
        .enumerate()
        .map(|(i, step)| {
            format!(
                "  {:>2}. {} {}\n",
                i + 1,
                format_phase(step.phase),
                style(&step.id).bold()
            )
        })
        .collect()
}

/// Format call metadata for display
pub fn format_metadata(metadata: &Metadata) -> String {
    let mut lines = Vec::new();
    let mut push = |label: &str, value: Option<String>| {
        if let Some(value) = value {
            lines.push(format!("  {}: {}", label, style(value).dim()));
        }
    };

    push("Service", metadata.service_id.clone());
    push("Operation", metadata.operation.clone());
    push("Region", metadata.region.clone());
    push("Invocation ID", metadata.invocation_id.clone());
    push("Request ID", metadata.request_id.clone());
    push("Attempts", Some(metadata.attempts.to_string()));
    push("Elapsed", metadata.elapsed_ms.map(|ms| format!("{}ms", ms)));
    for (key, value) in &metadata.values {
        push(key.as_str(), Some(value.clone()));
    }

    lines.join("\n")
}

/// Format an error, naming where in the pipeline it happened
pub fn format_error(error: &PipelineError) -> String {
    match error {
        PipelineError::Step { phase, step, source, .. } => format!(
            "{} {} step {} failed: {}",
            CROSS,
            format_phase(*phase).trim_end(),
            style(step).bold(),
            style(source).red()
        ),
        PipelineError::Cancelled { boundary, .. } => format!(
            "{} cancelled before {}",
            WARN,
            style(boundary).yellow()
        ),
        other => format!("{} {}", CROSS, style(other).red()),
    }
}
