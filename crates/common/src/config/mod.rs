//! Configuration management for the CiteGraph engine
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Backend aggregation endpoint configuration
    pub api: ApiConfig,

    /// Fetch pipeline tuning
    #[serde(default)]
    pub fetch: FetchTuning,

    /// Graph rendering tuning
    #[serde(default)]
    pub graph: GraphTuning,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the backend aggregation endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchTuning {
    /// Quiescence window before a fetch is issued, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Numeric cap for `top` depth on single-seed requests
    #[serde(default = "default_top_cap")]
    pub top_cap: u32,

    /// Numeric cap for `all` depth on single-seed requests
    #[serde(default = "default_all_cap")]
    pub all_cap: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphTuning {
    /// Fixed render size for seed nodes
    #[serde(default = "default_seed_size")]
    pub seed_size: f64,

    /// Minimum render size for non-seed nodes
    #[serde(default = "default_base_size")]
    pub base_size: f64,

    /// Maximum render size for non-seed nodes
    #[serde(default = "default_max_size")]
    pub max_size: f64,

    /// Multiplier applied to sqrt(citation_count + 1)
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,

    /// Node label character budget before truncation
    #[serde(default = "default_label_chars")]
    pub label_chars: usize,
}

// Default value functions
fn default_base_url() -> String { "http://localhost:8080/api/network".to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_debounce_ms() -> u64 { 300 }
fn default_top_cap() -> u32 { 50 }
fn default_all_cap() -> u32 { 1000 }
fn default_seed_size() -> f64 { 30.0 }
fn default_base_size() -> f64 { 10.0 }
fn default_max_size() -> f64 { 28.0 }
fn default_scale_factor() -> f64 { 2.0 }
fn default_label_chars() -> usize { 40 }

impl EngineConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        tracing::debug!(environment = %env, "Loading engine configuration");

        let config = Config::builder()
            // Start with defaults
            .set_default("api.base_url", default_base_url())?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__API__BASE_URL=https://...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    /// Get debounce window as Duration
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.fetch.debounce_ms)
    }
}

impl Default for FetchTuning {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            top_cap: default_top_cap(),
            all_cap: default_all_cap(),
        }
    }
}

impl Default for GraphTuning {
    fn default() -> Self {
        Self {
            seed_size: default_seed_size(),
            base_size: default_base_size(),
            max_size: default_max_size(),
            scale_factor: default_scale_factor(),
            label_chars: default_label_chars(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: default_base_url(),
                request_timeout_secs: default_request_timeout(),
            },
            fetch: FetchTuning::default(),
            graph: GraphTuning::default(),
        }
    }
}
