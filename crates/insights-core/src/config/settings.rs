//! Loader settings — where to fetch `llm-config.json` from and how long to wait.
//!
//! # Precedence
//! 1. Defaults (from `LoaderSettings::default()`)
//! 2. Environment variables `INSIGHTS_CONFIG__<FIELD>` (override defaults)
//! 3. Explicit values set by the caller (e.g. CLI flags)

use std::time::Duration;

use tracing::{debug, warn};

use super::schema::DEFAULT_CONFIG_PATH;

/// Default host serving the insights frontend and its config document.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Default upper bound on a single config fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How the configuration loader reaches the external document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderSettings {
    /// Scheme + host (+ optional prefix), e.g. `"http://127.0.0.1:3000"`.
    pub base_url: String,
    /// Path of the document under `base_url`.
    pub config_path: String,
    /// Bound on the whole fetch; exceeding it counts as a network failure.
    pub timeout: Duration,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LoaderSettings {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        apply_env_overrides(Self::default(), |key| std::env::var(key).ok())
    }

    /// Full URL of the config document, joined with exactly one `/`.
    pub fn config_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.config_path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

/// Apply environment variable overrides.
///
/// - `INSIGHTS_CONFIG__BASE_URL` → `base_url`
/// - `INSIGHTS_CONFIG__PATH` → `config_path`
/// - `INSIGHTS_CONFIG__TIMEOUT_SECS` → `timeout` (ignored unless a positive integer)
///
/// Variables are read through `env` so tests never touch the process environment.
fn apply_env_overrides(
    mut settings: LoaderSettings,
    env: impl Fn(&str) -> Option<String>,
) -> LoaderSettings {
    if let Some(val) = env("INSIGHTS_CONFIG__BASE_URL") {
        settings.base_url = val;
    }
    if let Some(val) = env("INSIGHTS_CONFIG__PATH") {
        settings.config_path = val;
    }
    if let Some(val) = env("INSIGHTS_CONFIG__TIMEOUT_SECS") {
        match val.parse::<u64>() {
            Ok(n) if n > 0 => settings.timeout = Duration::from_secs(n),
            _ => warn!(value = %val, "ignoring invalid INSIGHTS_CONFIG__TIMEOUT_SECS"),
        }
    }

    debug!(url = %settings.config_url(), timeout = ?settings.timeout, "loader settings resolved");
    settings
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
