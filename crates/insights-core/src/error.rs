//! Error type for configuration loading.
//!
//! Every variant ends up in the same place: the loader logs it and serves the
//! fallback snapshot. The variants exist so the log line says what went wrong.

use std::time::Duration;

/// Why the external configuration document could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Transport-level failure (connection refused, DNS, TLS, body read).
    #[error("request failed: {0}")]
    Http(String),

    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {0}")]
    Status(u16),

    /// No answer within the configured bound.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Body is not valid JSON.
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Valid JSON that breaks the document shape or snapshot invariants.
    #[error("invalid config document: {0}")]
    InvalidDocument(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
