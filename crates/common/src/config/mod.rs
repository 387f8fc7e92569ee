//! Configuration management for the Agora engine
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Corpus location and load behavior
    pub corpus: CorpusConfig,

    /// Traversal and seed-selection bounds
    pub retrieval: RetrievalConfig,

    /// Shared response cache configuration
    pub cache: CacheConfig,

    /// Downstream model-call admission
    pub downstream: DownstreamConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorpusConfig {
    /// Root directory containing one subdirectory per partition
    pub data_root: PathBuf,

    /// Maximum description length retained per entity at load
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Maximum traversal depth during weighted expansion
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Maximum entities returned by one expansion
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Top communities considered by the community seed strategy
    #[serde(default = "default_max_communities")]
    pub max_communities: usize,

    /// Top entities retained by the global seed strategy
    #[serde(default = "default_max_global_matches")]
    pub max_global_matches: usize,

    /// Cap on member entities collected per matched community
    #[serde(default = "default_max_seeds_per_community")]
    pub max_seeds_per_community: usize,

    /// Cap on chunks attached per seed entity when chunks are requested
    #[serde(default = "default_max_chunks_per_entity")]
    pub max_chunks_per_entity: usize,

    /// Cap on total chunks attached to an expansion result
    #[serde(default = "default_max_total_chunks")]
    pub max_total_chunks: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum number of cached responses
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Entry time-to-live in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownstreamConfig {
    /// Maximum simultaneously in-flight downstream model calls
    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,

    /// Per-query timeout in seconds
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_max_description_len() -> usize { 300 }
fn default_max_hops() -> usize { 3 }
fn default_max_results() -> usize { 200 }
fn default_max_communities() -> usize { 15 }
fn default_max_global_matches() -> usize { 100 }
fn default_max_seeds_per_community() -> usize { 25 }
fn default_max_chunks_per_entity() -> usize { 2 }
fn default_max_total_chunks() -> usize { 20 }
fn default_cache_capacity() -> usize { 1000 }
fn default_cache_ttl() -> u64 { 900 }
fn default_max_concurrent_calls() -> usize { 5 }
fn default_query_timeout() -> u64 { 30 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "agora".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("corpus.data_root", "./data")?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__RETRIEVAL__MAX_HOPS=4
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

    /// Get cache TTL as Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Get per-query timeout as Duration
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.downstream.query_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            corpus: CorpusConfig {
                data_root: PathBuf::from("./data"),
                max_description_len: default_max_description_len(),
            },
            retrieval: RetrievalConfig::default(),
            cache: CacheConfig {
                capacity: default_cache_capacity(),
                ttl_secs: default_cache_ttl(),
            },
            downstream: DownstreamConfig {
                max_concurrent_calls: default_max_concurrent_calls(),
                query_timeout_secs: default_query_timeout(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                service_name: default_service_name(),
            },
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            max_results: default_max_results(),
            max_communities: default_max_communities(),
            max_global_matches: default_max_global_matches(),
            max_seeds_per_community: default_max_seeds_per_community(),
            max_chunks_per_entity: default_max_chunks_per_entity(),
            max_total_chunks: default_max_total_chunks(),
        }
    }
}
