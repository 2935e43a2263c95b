//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SQLEXPORT_*)
//! 2. TOML config file (if SQLEXPORT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CHUNK_SIZE;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SQLEXPORT_*)
/// 2. TOML config file (if SQLEXPORT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment label, used only in logs.
    #[serde(default = "default_env")]
    pub env: String,

    /// Address the HTTP server binds to.
    ///
    /// Set via SQLEXPORT_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Redis connection URL, e.g. `redis://localhost:6379/0`.
    ///
    /// Set via SQLEXPORT_REDIS_URL environment variable.
    #[serde(default)]
    pub redis_url: String,

    /// PostgreSQL connection string.
    ///
    /// Set via SQLEXPORT_POSTGRES_URL environment variable.
    #[serde(default)]
    pub postgres_url: String,

    /// Maximum pooled PostgreSQL connections.
    #[serde(default = "default_postgres_pool_size")]
    pub postgres_pool_size: usize,

    /// TTL applied to every cached part and meta record, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Deadline for populating the cache after a miss, in milliseconds.
    #[serde(default = "default_cache_write_timeout_ms")]
    pub cache_write_timeout_ms: u64,

    /// Upper bound on a single cached part, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Directory receiving export snapshots.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
}

fn default_env() -> String {
    "prod".into()
}

fn default_listen_addr() -> String {
    "localhost:8080".into()
}

fn default_request_timeout_ms() -> u64 {
    120_000
}

fn default_postgres_pool_size() -> usize {
    16
}

fn default_cache_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_cache_write_timeout_ms() -> u64 {
    5_000
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: default_env(),
            listen_addr: default_listen_addr(),
            request_timeout_ms: default_request_timeout_ms(),
            redis_url: String::new(),
            postgres_url: String::new(),
            postgres_pool_size: default_postgres_pool_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_write_timeout_ms: default_cache_write_timeout_ms(),
            chunk_size: default_chunk_size(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_write_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_write_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SQLEXPORT_`
    /// 2. TOML file from `SQLEXPORT_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SQLEXPORT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SQLEXPORT_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::from_figment(&figment)
    }

    /// Extract and validate configuration from a prepared figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
