//! Configuration — snapshot schema, document parsing, and loader settings.
//!
//! # Usage
//! ```
//! use insights_core::config;
//!
//! let snap = config::parse_document(r#"{"llms": []}"#).unwrap();
//! assert_eq!(snap.api_endpoint, config::DEFAULT_API_ENDPOINT);
//! ```

pub mod schema;
pub mod settings;

// Re-export key types
pub use schema::{
    parse_document, ConfigSnapshot, SnapshotSource, DEFAULT_API_ENDPOINT, DEFAULT_CONFIG_PATH,
};
pub use settings::LoaderSettings;
