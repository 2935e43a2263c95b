//! In-process key-value store with per-entry expiry.
//!
//! Expiry runs on the tokio clock, so paused-time tests can step past a TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::kv::{CacheError, KvStore};

struct Entry {
    value: Bytes,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// `KvStore` backed by a `HashMap` behind a tokio `RwLock`.
///
/// Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryKv {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a key regardless of its TTL. Returns whether it was present.
    pub async fn remove(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Number of unexpired keys.
    pub async fn live_keys(&self) -> usize {
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired())
            .count()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(Entry::is_expired) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::Backend(format!("invalid expire time for {key}")));
        }

        let entry = Entry { value, expires_at: Instant::now() + ttl };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }
}
