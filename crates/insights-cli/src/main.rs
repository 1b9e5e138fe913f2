//! Insights CLI — entry point.
//!
//! # Commands
//!
//! - `insights show [--base-url URL] [--path P] [--timeout SECS] [--json]` — load and print
//! - `insights builtin [--json]` — print the compiled-in provider list

mod show;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use insights_core::{ConfigSnapshot, LoaderSettings};
use insights_loader::ConfigLoader;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Inspect the LLM provider configuration used by AI insights
#[derive(Parser)]
#[command(name = "insights", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load llm-config.json (with fallback) and print the result
    Show {
        /// Host serving the config document (overrides INSIGHTS_CONFIG__BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Path of the config document (overrides INSIGHTS_CONFIG__PATH)
        #[arg(long)]
        path: Option<String>,

        /// Fetch timeout in seconds (overrides INSIGHTS_CONFIG__TIMEOUT_SECS)
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the snapshot as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Print the compiled-in provider list (no network access)
    Builtin {
        /// Print the snapshot as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Show {
            base_url,
            path,
            timeout,
            json,
            logs,
        } => {
            init_logging(logs);
            let settings = resolve_settings(base_url, path, timeout);
            run_show(&settings, json).await
        }
        Commands::Builtin { json } => {
            init_logging(false);
            let loader = ConfigLoader::preloaded(ConfigSnapshot::builtin());
            show::print(&loader.configuration(), json)
        }
    }
}

/// Env-derived settings with CLI flags layered on top.
fn resolve_settings(
    base_url: Option<String>,
    path: Option<String>,
    timeout: Option<u64>,
) -> LoaderSettings {
    let mut settings = LoaderSettings::from_env();
    if let Some(url) = base_url {
        settings.base_url = url;
    }
    if let Some(p) = path {
        settings.config_path = p;
    }
    if let Some(secs) = timeout.filter(|s| *s > 0) {
        settings.timeout = Duration::from_secs(secs);
    }
    settings
}

async fn run_show(settings: &LoaderSettings, json: bool) -> Result<()> {
    let loader =
        ConfigLoader::from_settings(settings).context("failed to create config loader")?;

    info!(url = %settings.config_url(), "loading llm config");
    let snapshot = loader.ensure_loaded().await;
    show::print(&snapshot, json)
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("insights=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
