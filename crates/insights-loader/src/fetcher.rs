//! Config fetchers — where the raw `llm-config.json` body comes from.
//!
//! [`ConfigLoader`](crate::ConfigLoader) only sees the [`ConfigFetcher`] trait,
//! so tests can swap the HTTP client for an in-memory fake.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use insights_core::error::{ConfigError, Result};
use insights_core::LoaderSettings;

// ─────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────

/// Source of the external configuration document.
#[async_trait]
pub trait ConfigFetcher: Send + Sync {
    /// Fetch the raw document body.
    ///
    /// Transport failures and non-2xx statuses are errors; parsing is the caller's job.
    async fn fetch(&self) -> Result<String>;

    /// Where this fetcher reads from, for logging.
    fn describe(&self) -> String;
}

// ─────────────────────────────────────────────
// HTTP
// ─────────────────────────────────────────────

/// Fetches the document with a plain `GET` via `reqwest`.
pub struct HttpConfigFetcher {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl std::fmt::Debug for HttpConfigFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfigFetcher")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpConfigFetcher {
    /// Create a fetcher for an absolute document URL.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    /// Create a fetcher from loader settings (`base_url` + `config_path`).
    pub fn from_settings(settings: &LoaderSettings) -> Result<Self> {
        Self::new(settings.config_url(), settings.timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ConfigFetcher for HttpConfigFetcher {
    async fn fetch(&self) -> Result<String> {
        debug!(url = %self.url, "fetching llm config");

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, status = %status, "llm config request rejected");
            return Err(ConfigError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        debug!(bytes = body.len(), "llm config received");
        Ok(body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

impl HttpConfigFetcher {
    fn classify(&self, err: reqwest::Error) -> ConfigError {
        if err.is_timeout() {
            ConfigError::Timeout(self.timeout)
        } else {
            ConfigError::Http(err.to_string())
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
