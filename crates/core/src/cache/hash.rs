//! Content-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Namespace prefix shared by every cached export.
pub const KEY_PREFIX: &str = "query_cache";

/// Compute the cache key for a query.
///
/// Surrounding whitespace is not significant. The key has a fixed length
/// regardless of query size.
pub fn compute_cache_key(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.trim().as_bytes());
    format!("{KEY_PREFIX}:{}", hex::encode(hasher.finalize()))
}
