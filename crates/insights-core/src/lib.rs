//! Core data for the AI insights LLM configuration.
//!
//! - [`types::ProviderDescriptor`] — one LLM backend's identity and credentials
//! - [`config`] — snapshot schema, `llm-config.json` parsing, loader settings
//! - [`error::ConfigError`] — why an external document was rejected

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigSnapshot, LoaderSettings, SnapshotSource};
pub use error::ConfigError;
pub use types::ProviderDescriptor;
