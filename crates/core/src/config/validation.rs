//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Largest value Redis accepts for a single key.
const MAX_CHUNK_SIZE: usize = 512 * 1024 * 1024;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if a connection string is empty, and
    /// `ConfigError::Invalid` if:
    /// - `cache_ttl_secs` or `chunk_size` is 0, or `chunk_size` exceeds 512MB
    /// - `cache_write_timeout_ms` is outside 100ms..=5 minutes
    /// - `request_timeout_ms` does not exceed `cache_write_timeout_ms`
    /// - `listen_addr` or `snapshot_dir` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redis_url.is_empty() {
            return Err(ConfigError::Missing {
                field: "redis_url".into(),
                hint: "Set SQLEXPORT_REDIS_URL environment variable".into(),
            });
        }
        if self.postgres_url.is_empty() {
            return Err(ConfigError::Missing {
                field: "postgres_url".into(),
                hint: "Set SQLEXPORT_POSTGRES_URL environment variable".into(),
            });
        }

        if self.postgres_pool_size == 0 {
            return Err(ConfigError::Invalid {
                field: "postgres_pool_size".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid { field: "cache_ttl_secs".into(), reason: "must be greater than 0".into() });
        }

        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid { field: "chunk_size".into(), reason: "must be greater than 0".into() });
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::Invalid { field: "chunk_size".into(), reason: "must not exceed 512MB".into() });
        }

        if self.cache_write_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "cache_write_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.cache_write_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "cache_write_timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.request_timeout_ms <= self.cache_write_timeout_ms {
            return Err(ConfigError::Invalid {
                field: "request_timeout_ms".into(),
                reason: "must exceed cache_write_timeout_ms".into(),
            });
        }

        if self.listen_addr.is_empty() {
            return Err(ConfigError::Invalid { field: "listen_addr".into(), reason: "must not be empty".into() });
        }
        if self.snapshot_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "snapshot_dir".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}
