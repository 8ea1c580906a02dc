//! Backing store trait definition.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// A key-value store with per-entry expiry, counters and hashes.
///
/// This trait abstracts over the store tagcache sits in front of
/// (Redis, an in-process map, ...). Keys and hash fields are strings,
/// values are opaque bytes. Counters are stored as decimal strings so
/// `get` on a counter key returns its textual value.
///
/// # Implementors
///
/// - `MemoryStore` - In-process store, used by tests and single-node setups
/// - `RedisStore` - Redis via a connection manager (feature `redis`)
///
/// # Example
///
/// ```ignore
/// use tagcache_store::{KeyValueStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set_with_ttl("greeting", b"hi", Duration::from_secs(60)).await?;
/// assert_eq!(store.get("greeting").await?, Some(b"hi".to_vec()));
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a string value.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes a string value without expiry.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Writes a string value that expires after `ttl`.
    ///
    /// Returns the store's write acknowledgment.
    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Writes a value without expiry only if the key is absent.
    ///
    /// Returns true if this call created the key. Must be atomic.
    async fn set_nx(&self, key: &str, value: &[u8]) -> Result<bool, StoreError>;

    /// Writes a value with expiry only if the key is absent.
    ///
    /// Returns true if this call created the key. The default
    /// implementation checks then writes, which is not atomic; stores
    /// that can do better override it.
    async fn set_nx_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        if self.exists(key).await? {
            return Ok(false);
        }
        self.set_with_ttl(key, value, ttl).await
    }

    /// Returns true if the key holds a live value.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Atomically increments an integer key, creating it at 0 first.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Reads one field of a hash.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes one field of a hash.
    async fn hset(&self, key: &str, field: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Writes one field of a hash only if the field is absent.
    ///
    /// Returns true if this call created the field. Must be atomic.
    async fn hset_nx(&self, key: &str, field: &str, value: &[u8]) -> Result<bool, StoreError>;

    /// Atomically adds `delta` to an integer hash field, creating it at 0 first.
    async fn hincr(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError>;

    /// Deletes one field of a hash. Returns true if it existed.
    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// Reads every field of a hash. A missing hash is empty.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, Vec<u8>>, StoreError>;

    /// Verifies the store is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Returns the name of this store, used for logging.
    fn name(&self) -> &str;
}

impl std::fmt::Debug for dyn KeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueStore")
            .field("name", &self.name())
            .finish()
    }
}

/// Parses a counter stored as a decimal string.
pub fn parse_counter(key: &str, raw: &[u8]) -> Result<i64, StoreError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| StoreError::NotAnInteger {
            key: key.to_string(),
        })
}
