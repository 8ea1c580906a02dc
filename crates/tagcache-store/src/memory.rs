//! In-process key-value store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::{KeyValueStore, parse_counter};

/// A value held by the memory store.
#[derive(Debug, Clone)]
enum Value {
    Bytes(Vec<u8>),
    Hash(HashMap<String, Vec<u8>>),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug)]
struct Inner {
    name: String,
    data: Mutex<HashMap<String, Slot>>,
    online: AtomicBool,
}

/// In-process store with Redis-like semantics.
///
/// Every command runs under a single lock, so increments and
/// `set_nx_with_ttl` are atomic. Expiry is measured with
/// `tokio::time::Instant`; tests running on a paused runtime can
/// advance time to expire entries. Expired keys are dropped lazily
/// on access.
///
/// Cloning is cheap and clones share the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates an empty, reachable store.
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Creates an empty store with a custom name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                data: Mutex::new(HashMap::new()),
                online: AtomicBool::new(true),
            }),
        }
    }

    /// Creates a store that refuses every command, including health checks.
    pub fn offline() -> Self {
        let store = Self::named("memory-offline");
        store.set_online(false);
        store
    }

    /// Simulates the store going down or coming back.
    pub fn set_online(&self, online: bool) {
        self.inner.online.store(online, Ordering::SeqCst);
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .data
            .lock()
            .values()
            .filter(|slot| !slot.is_expired(now))
            .count()
    }

    /// Returns true if no live keys exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .inner
            .data
            .lock()
            .iter()
            .filter(|(_, slot)| !slot.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Remaining time to live of a key, if it has one.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let data = self.inner.data.lock();
        let slot = data.get(key).filter(|slot| !slot.is_expired(now))?;
        slot.expires_at.map(|at| at.saturating_duration_since(now))
    }

    /// Drops one key, returning true if it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.inner.data.lock().remove(key).is_some()
    }

    /// Drops every key.
    pub fn clear(&self) {
        self.inner.data.lock().clear();
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.inner.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::unavailable(format!(
                "{} is offline",
                self.inner.name
            )))
        }
    }

    /// Runs `f` over the data map after evicting `key` if it expired.
    fn with_key<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut HashMap<String, Slot>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.ensure_online()?;
        let now = Instant::now();
        let mut data = self.inner.data.lock();
        if data.get(key).is_some_and(|slot| slot.is_expired(now)) {
            debug!(key = %key, "Dropping expired key");
            data.remove(key);
        }
        f(&mut data)
    }

    fn write_bytes(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), StoreError> {
        let expires_at = ttl.map(expiry).transpose()?;
        self.with_key(key, |data| {
            data.insert(
                key.to_string(),
                Slot {
                    value: Value::Bytes(value.to_vec()),
                    expires_at,
                },
            );
            Ok(())
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Deadline `ttl` from now, or an error if it cannot be represented.
fn expiry(ttl: Duration) -> Result<Instant, StoreError> {
    Instant::now()
        .checked_add(ttl)
        .ok_or(StoreError::TtlOutOfRange {
            seconds: ttl.as_secs(),
        })
}

fn hash_mut<'a>(
    data: &'a mut HashMap<String, Slot>,
    key: &str,
) -> Result<&'a mut HashMap<String, Vec<u8>>, StoreError> {
    let slot = data.entry(key.to_string()).or_insert_with(|| Slot {
        value: Value::Hash(HashMap::new()),
        expires_at: None,
    });
    match &mut slot.value {
        Value::Hash(fields) => Ok(fields),
        Value::Bytes(_) => Err(StoreError::wrong_type(key, "hash")),
    }
}

fn hash_ref<'a>(
    data: &'a HashMap<String, Slot>,
    key: &str,
) -> Result<Option<&'a HashMap<String, Vec<u8>>>, StoreError> {
    match data.get(key).map(|slot| &slot.value) {
        None => Ok(None),
        Some(Value::Hash(fields)) => Ok(Some(fields)),
        Some(Value::Bytes(_)) => Err(StoreError::wrong_type(key, "hash")),
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.with_key(key, |data| match data.get(key).map(|slot| &slot.value) {
            None => Ok(None),
            Some(Value::Bytes(bytes)) => Ok(Some(bytes.clone())),
            Some(Value::Hash(_)) => Err(StoreError::wrong_type(key, "string")),
        })
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.write_bytes(key, value, None)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.write_bytes(key, value, Some(ttl))?;
        Ok(true)
    }

    async fn set_nx_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let expires_at = expiry(ttl)?;
        self.with_key(key, |data| {
            if data.contains_key(key) {
                return Ok(false);
            }
            data.insert(
                key.to_string(),
                Slot {
                    value: Value::Bytes(value.to_vec()),
                    expires_at: Some(expires_at),
                },
            );
            Ok(true)
        })
    }

    async fn set_nx(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        self.with_key(key, |data| {
            if data.contains_key(key) {
                return Ok(false);
            }
            data.insert(
                key.to_string(),
                Slot {
                    value: Value::Bytes(value.to_vec()),
                    expires_at: None,
                },
            );
            Ok(true)
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.with_key(key, |data| Ok(data.contains_key(key)))
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.with_key(key, |data| {
            let slot = data.entry(key.to_string()).or_insert_with(|| Slot {
                value: Value::Bytes(b"0".to_vec()),
                expires_at: None,
            });
            match &mut slot.value {
                Value::Bytes(bytes) => {
                    let next = parse_counter(key, bytes)? + 1;
                    *bytes = next.to_string().into_bytes();
                    Ok(next)
                },
                Value::Hash(_) => Err(StoreError::wrong_type(key, "string")),
            }
        })
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.with_key(key, |data| {
            Ok(hash_ref(data, key)?.and_then(|fields| fields.get(field).cloned()))
        })
    }

    async fn hset(&self, key: &str, field: &str, value: &[u8]) -> Result<(), StoreError> {
        self.with_key(key, |data| {
            hash_mut(data, key)?.insert(field.to_string(), value.to_vec());
            Ok(())
        })
    }

    async fn hset_nx(&self, key: &str, field: &str, value: &[u8]) -> Result<bool, StoreError> {
        self.with_key(key, |data| {
            let fields = hash_mut(data, key)?;
            if fields.contains_key(field) {
                return Ok(false);
            }
            fields.insert(field.to_string(), value.to_vec());
            Ok(true)
        })
    }

    async fn hincr(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        self.with_key(key, |data| {
            let fields = hash_mut(data, key)?;
            let current = match fields.get(field) {
                Some(raw) => parse_counter(key, raw)?,
                None => 0,
            };
            let next = current + delta;
            fields.insert(field.to_string(), next.to_string().into_bytes());
            Ok(next)
        })
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.with_key(key, |data| {
            let removed = match data.get_mut(key).map(|slot| &mut slot.value) {
                None => false,
                Some(Value::Hash(fields)) => fields.remove(field).is_some(),
                Some(Value::Bytes(_)) => return Err(StoreError::wrong_type(key, "hash")),
            };
            // Redis drops a hash once its last field is gone.
            if matches!(data.get(key).map(|slot| &slot.value), Some(Value::Hash(f)) if f.is_empty())
            {
                data.remove(key);
            }
            Ok(removed)
        })
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, Vec<u8>>, StoreError> {
        self.with_key(key, |data| {
            Ok(hash_ref(data, key)?.cloned().unwrap_or_default())
        })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.ensure_online()
    }

    fn name(&self) -> &str {
        &self.inner.name
    }
}
