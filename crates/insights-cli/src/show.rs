//! `insights show` / `insights builtin` output.
//!
//! Shows where the snapshot came from, the shared endpoint, and each provider
//! with its default model and credential status.

use anyhow::{Context, Result};
use colored::Colorize;

use insights_core::{ConfigSnapshot, ProviderDescriptor, SnapshotSource};

/// Print a snapshot, either as the JSON document shape or as a table.
pub fn print(snapshot: &ConfigSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", render_json(snapshot)?);
        return Ok(());
    }

    println!();
    println!("{}", "AI Insights LLM Config".cyan().bold());
    println!();

    println!("  {:<18} {}", "Source:".bold(), source_label(snapshot.source));
    println!("  {:<18} {}", "Endpoint:".bold(), snapshot.api_endpoint);

    println!();
    println!("  {}", "Providers:".bold());
    if snapshot.providers.is_empty() {
        println!("    {}", "(none)".dimmed());
    }
    for provider in &snapshot.providers {
        println!(
            "    {:<12} {:<24} {}",
            provider.name,
            provider.default_model.dimmed(),
            credential_status(provider)
        );
    }

    println!();
    Ok(())
}

/// The snapshot in `llm-config.json` shape (`llms` + `apiEndpoint`).
fn render_json(snapshot: &ConfigSnapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).context("failed to serialize config")
}

fn source_label(source: SnapshotSource) -> String {
    match source {
        SnapshotSource::Remote => format!("{}", "llm-config.json ✓".green()),
        SnapshotSource::Builtin => "compiled-in".to_string(),
        SnapshotSource::Fallback => format!("{}", "fallback (config unavailable)".yellow()),
        SnapshotSource::Empty => format!("{}", "not loaded".red()),
    }
}

fn credential_status(provider: &ProviderDescriptor) -> String {
    if provider.uses_cli_instead {
        return format!("{}", "· uses CLI".dimmed());
    }
    match &provider.requires_api_key {
        Some(var) if provider.api_key_configured() => format!("{} ({} set)", "✓".green(), var),
        Some(var) => format!("{} ({} missing)", "✗".red(), var),
        None => format!("{}", "· no key needed".dimmed()),
    }
}
