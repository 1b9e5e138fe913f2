//! Provider descriptors: one record per LLM backend shown in the insights UI.
//!
//! JSON uses **camelCase** keys (`cacheKey`, `defaultModel`, …) to match
//! `llm-config.json`; Rust uses snake_case via `#[serde(rename_all)]`.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// ProviderDescriptor
// ─────────────────────────────────────────────

/// Describes one LLM backend: identity, default model, and credential requirement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    /// Stable identifier (e.g. `"gemini"`). Unique within a snapshot.
    pub id: String,
    /// Human-readable label (e.g. `"Gemini"`).
    pub name: String,
    /// Name of the client-side cache bucket for this provider's insights.
    pub cache_key: String,
    /// Model used when the caller does not pick one.
    pub default_model: String,
    /// Environment variable that holds this provider's API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_api_key: Option<String>,
    /// Provider authenticates through a CLI flow rather than an API key.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub uses_cli_instead: bool,
}

impl ProviderDescriptor {
    /// Create a descriptor that needs no API key.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        cache_key: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cache_key: cache_key.into(),
            default_model: default_model.into(),
            requires_api_key: None,
            uses_cli_instead: false,
        }
    }

    /// Builder: name the env var carrying the API key.
    pub fn with_api_key(mut self, env_var: impl Into<String>) -> Self {
        self.requires_api_key = Some(env_var.into());
        self
    }

    /// Builder: mark the provider as CLI-authenticated.
    pub fn via_cli(mut self) -> Self {
        self.uses_cli_instead = true;
        self
    }

    /// Whether the credential this provider needs is available.
    ///
    /// Providers without `requiresApiKey` are always considered configured.
    pub fn api_key_configured(&self) -> bool {
        self.api_key_configured_with(|var| std::env::var(var).ok())
    }

    /// Same as [`api_key_configured`](Self::api_key_configured), reading
    /// variables through `lookup` instead of the process environment.
    pub fn api_key_configured_with(&self, lookup: impl Fn(&str) -> Option<String>) -> bool {
        match &self.requires_api_key {
            Some(var) => lookup(var.as_str()).is_some_and(|v| !v.is_empty()),
            None => true,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
