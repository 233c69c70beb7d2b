//! CiteGraph Common Library
//!
//! Shared code for the citation network engine:
//! - Canonical Paper/Author data model and graph view types
//! - Error types and handling
//! - Configuration management

pub mod config;
pub mod errors;
pub mod model;

// Re-export commonly used types
pub use config::EngineConfig;
pub use errors::{EngineError, Result};
pub use model::{CitationNetwork, DataSource, Depth, FetchOptions, Paper};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
