//! Chunked payload storage over a single-value key-value backend.
//!
//! A payload stored under `K` is laid out as:
//!
//! - `K:part:0 .. K:part:{n-1}`, each holding at most `chunk_size` bytes
//! - `K:meta`, holding `parts:{n}`
//!
//! Every sub-key carries the TTL given at write time. Parts are written in
//! index order and the meta record last, but the writes are not
//! transactional: a reader racing a writer on the same key can see meta
//! before all parts land, which surfaces as `CacheError::Corrupt`.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use super::kv::{CacheError, KvStore};

/// Default upper bound on a single part (10 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

const META_PREFIX: &str = "parts:";

fn meta_key(key: &str) -> String {
    format!("{key}:meta")
}

fn part_key(key: &str, index: usize) -> String {
    format!("{key}:part:{index}")
}

/// Split `payload` into consecutive slices of at most `chunk_size` bytes.
///
/// An empty payload yields no chunks.
fn split_into_chunks(payload: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    (0..payload.len())
        .step_by(chunk_size)
        .map(|start| payload.slice(start..payload.len().min(start + chunk_size)))
        .collect()
}

fn parse_meta(key: &str, meta: &[u8]) -> Result<usize, CacheError> {
    std::str::from_utf8(meta)
        .ok()
        .and_then(|s| s.strip_prefix(META_PREFIX))
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| {
            CacheError::Corrupt(format!("{key}: invalid meta format {:?}", String::from_utf8_lossy(meta)))
        })
}

/// Cache store that splits large payloads across several backend keys.
#[derive(Clone)]
pub struct ChunkedStore {
    kv: Arc<dyn KvStore>,
    chunk_size: usize,
}

impl ChunkedStore {
    /// Create a store using [`DEFAULT_CHUNK_SIZE`].
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::with_chunk_size(kv, DEFAULT_CHUNK_SIZE)
    }

    /// Create a store with an explicit part size. Zero is clamped to one byte.
    pub fn with_chunk_size(kv: Arc<dyn KvStore>, chunk_size: usize) -> Self {
        Self { kv, chunk_size: chunk_size.max(1) }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Store `payload` under `key`, replacing any previous entry.
    ///
    /// Fails on the first backend error; parts already written are left to
    /// expire on their own.
    pub async fn put(&self, key: &str, payload: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let parts = split_into_chunks(&payload, self.chunk_size);

        for (index, part) in parts.iter().enumerate() {
            self.kv.set(&part_key(key, index), part.clone(), ttl).await?;
        }

        let meta = Bytes::from(format!("{META_PREFIX}{}", parts.len()));
        self.kv.set(&meta_key(key), meta, ttl).await?;

        tracing::debug!(key, parts = parts.len(), bytes = payload.len(), "stored chunked cache entry");
        Ok(())
    }

    /// Whether a live meta record exists for `key`.
    ///
    /// Parts are not checked, so `true` does not guarantee `get` succeeds.
    /// Backend errors are logged and reported as absent.
    pub async fn exists(&self, key: &str) -> bool {
        match self.kv.get(&meta_key(key)).await {
            Ok(meta) => meta.is_some(),
            Err(e) => {
                tracing::warn!(key, error = %e, "cache meta lookup failed; treating as absent");
                false
            }
        }
    }

    /// Reassemble the payload stored under `key`.
    ///
    /// A missing meta record is a `Miss`. A malformed meta record, or a meta
    /// record whose parts cannot all be read, is `Corrupt`.
    pub async fn get(&self, key: &str) -> Result<Bytes, CacheError> {
        let meta = self
            .kv
            .get(&meta_key(key))
            .await?
            .ok_or_else(|| CacheError::Miss(key.to_string()))?;
        let count = parse_meta(key, &meta)?;

        let mut payload = BytesMut::new();
        for index in 0..count {
            let part = self
                .kv
                .get(&part_key(key, index))
                .await?
                .ok_or_else(|| CacheError::Corrupt(format!("{key}: part {index} of {count} missing")))?;
            payload.extend_from_slice(&part);
        }

        tracing::debug!(key, parts = count, bytes = payload.len(), "read chunked cache entry");
        Ok(payload.freeze())
    }
}
