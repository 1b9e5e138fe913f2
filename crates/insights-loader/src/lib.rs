//! Provider configuration loader for the AI insights UI.
//!
//! # Architecture
//!
//! - [`fetcher::ConfigFetcher`] — trait for anything that can produce the raw `llm-config.json`
//! - [`fetcher::HttpConfigFetcher`] — `reqwest` implementation (plain `GET`)
//! - [`loader::ConfigLoader`] — fetches once, falls back on any failure, shares the snapshot

pub mod fetcher;
pub mod loader;

// Re-export main types for convenience
pub use fetcher::{ConfigFetcher, HttpConfigFetcher};
pub use loader::ConfigLoader;
