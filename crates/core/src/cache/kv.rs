//! Key-value backend seam.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

/// Errors from the cache layer.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No live entry for the key.
    #[error("cache miss: {0}")]
    Miss(String),

    /// Meta record is malformed or names a part that cannot be read.
    #[error("cache entry corrupt: {0}")]
    Corrupt(String),

    /// The backend failed or is unreachable.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// The operation did not finish before its deadline.
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Raw get/set-with-TTL key-value primitive.
///
/// `get` returns `Ok(None)` for absent and expired keys alike.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;
}
