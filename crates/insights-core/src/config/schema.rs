//! Configuration snapshot — the provider list plus the shared API endpoint.
//!
//! The external document (`llm-config.json`) is shaped as
//! `{ "llms": [ProviderDescriptor, ...], "apiEndpoint": string }`.
//! Both fields are optional: a missing `llms` means no providers, a missing
//! `apiEndpoint` means [`DEFAULT_API_ENDPOINT`].

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::types::ProviderDescriptor;

/// Single endpoint shared by every provider.
pub const DEFAULT_API_ENDPOINT: &str = "/api/insights/analyze";

/// Path of the external configuration document.
pub const DEFAULT_CONFIG_PATH: &str = "/llm-config.json";

// ─────────────────────────────────────────────
// ConfigSnapshot
// ─────────────────────────────────────────────

/// Where a snapshot's data came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Nothing loaded yet.
    Empty,
    /// Compiled-in static list.
    Builtin,
    /// Parsed from the external document.
    Remote,
    /// External document unavailable; single-entry fallback.
    Fallback,
}

/// In-memory configuration: ordered providers and the endpoint path.
///
/// Provider order is rendering order for consumers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    #[serde(rename = "llms")]
    pub providers: Vec<ProviderDescriptor>,
    pub api_endpoint: String,
    #[serde(skip)]
    pub source: SnapshotSource,
}

impl ConfigSnapshot {
    /// No providers, default endpoint. What consumers see before a load completes.
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            source: SnapshotSource::Empty,
        }
    }

    /// The compiled-in provider list (Claude via CLI, Gemini, OpenAI).
    pub fn builtin() -> Self {
        Self {
            providers: vec![
                ProviderDescriptor::new(
                    "claude",
                    "Claude",
                    "claudeInsightsCache",
                    "claude-sonnet-4-5",
                )
                .via_cli(),
                ProviderDescriptor::new("gemini", "Gemini", "geminiInsightsCache", "gemini-pro")
                    .with_api_key("GEMINI_API_KEY"),
                ProviderDescriptor::new(
                    "openai",
                    "OpenAI",
                    "openaiInsightsCache",
                    "gpt-4-turbo-preview",
                )
                .with_api_key("OPENAI_API_KEY"),
            ],
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            source: SnapshotSource::Builtin,
        }
    }

    /// Served when the external document cannot be loaded.
    pub fn fallback() -> Self {
        Self {
            providers: vec![ProviderDescriptor::new(
                "gemini",
                "Gemini",
                "geminiInsightsCache",
                "gemini-1.5-flash",
            )
            .with_api_key("GEMINI_API_KEY")],
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            source: SnapshotSource::Fallback,
        }
    }

    /// Look up a provider by id.
    pub fn find(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Check the snapshot invariants: unique ids, unique cache keys, non-empty endpoint.
    pub fn validate(&self) -> Result<()> {
        if self.api_endpoint.is_empty() {
            return Err(ConfigError::InvalidDocument("empty apiEndpoint".into()));
        }

        let mut ids = HashSet::new();
        let mut cache_keys = HashSet::new();
        for p in &self.providers {
            if !ids.insert(p.id.as_str()) {
                return Err(ConfigError::InvalidDocument(format!(
                    "duplicate provider id '{}'",
                    p.id
                )));
            }
            if !cache_keys.insert(p.cache_key.as_str()) {
                return Err(ConfigError::InvalidDocument(format!(
                    "duplicate cacheKey '{}'",
                    p.cache_key
                )));
            }
        }

        Ok(())
    }
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

// ─────────────────────────────────────────────
// Document parsing
// ─────────────────────────────────────────────

/// Parse an `llm-config.json` body into a snapshot.
///
/// Parse as `Value` first so a malformed `llms` or `apiEndpoint` degrades to
/// its default instead of rejecting the whole document. A body that is not a
/// JSON object, or whose providers break the invariants, is an error.
pub fn parse_document(body: &str) -> Result<ConfigSnapshot> {
    let raw: Value = serde_json::from_str(body)?;

    let Value::Object(mut doc) = raw else {
        return Err(ConfigError::InvalidDocument(
            "top-level value is not an object".into(),
        ));
    };

    let providers = match doc.remove("llms") {
        None | Some(Value::Null) => Vec::new(),
        Some(llms) => match serde_json::from_value::<Vec<ProviderDescriptor>>(llms) {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "ignoring malformed 'llms' field");
                Vec::new()
            }
        },
    };

    let api_endpoint = match doc.get("apiEndpoint") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        None => DEFAULT_API_ENDPOINT.to_string(),
        Some(other) => {
            warn!(value = %other, "ignoring invalid 'apiEndpoint', using default");
            DEFAULT_API_ENDPOINT.to_string()
        }
    };

    let snapshot = ConfigSnapshot {
        providers,
        api_endpoint,
        source: SnapshotSource::Remote,
    };
    snapshot.validate()?;
    Ok(snapshot)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
