#![allow(dead_code)]
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tagcache::{GcConfig, ManualClock, TagCache};
use tagcache_store::{KeyValueStore, MemoryStore, StoreError};

/// Unix time the test clocks start at.
pub const START: u64 = 1_700_000_000;

/// A cache over a fresh memory store, with a controllable clock.
pub struct Harness {
    pub cache: TagCache,
    pub store: MemoryStore,
    pub clock: ManualClock,
}

pub async fn harness() -> Harness {
    harness_with_gc(GcConfig::default()).await
}

pub async fn harness_with_gc(gc: GcConfig) -> Harness {
    let store = MemoryStore::new();
    let clock = ManualClock::new(START);
    let ttl = Duration::from_secs(gc.stale_after_secs.min(3600));
    let cache = TagCache::builder()
        .clock(clock.clone())
        .default_ttl(ttl)
        .gc(gc)
        .connect(Arc::new(store.clone()))
        .await
        .expect("memory store connects");
    Harness {
        cache,
        store,
        clock,
    }
}

/// A second facade over the same store, as another process would have.
pub async fn peer(store: &MemoryStore, clock: &ManualClock) -> TagCache {
    TagCache::builder()
        .clock(clock.clone())
        .connect(Arc::new(store.clone()))
        .await
        .expect("memory store connects")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    pub name: String,
}

pub fn profile() -> Profile {
    Profile {
        id: 42,
        name: "Ada".to_string(),
    }
}

type Hook = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A memory store that runs another writer's work right after a read misses.
///
/// Each hook fires once, between the miss and whatever the caller does
/// next, which pins down the interleaving a real race would only hit
/// occasionally.
#[derive(Clone)]
pub struct InterleavingStore {
    inner: MemoryStore,
    after_get_miss: Arc<Mutex<Option<Hook>>>,
    after_hget_miss: Arc<Mutex<Option<Hook>>>,
}

impl InterleavingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            after_get_miss: Arc::new(Mutex::new(None)),
            after_hget_miss: Arc::new(Mutex::new(None)),
        }
    }

    /// Runs `work` after the next `get` that finds nothing.
    pub fn after_get_miss(&self, work: impl Future<Output = ()> + Send + 'static) {
        *self.after_get_miss.lock() = Some(Box::pin(work));
    }

    /// Runs `work` after the next `hget` that finds nothing.
    pub fn after_hget_miss(&self, work: impl Future<Output = ()> + Send + 'static) {
        *self.after_hget_miss.lock() = Some(Box::pin(work));
    }

    async fn fire(slot: &Mutex<Option<Hook>>) {
        let hook = slot.lock().take();
        if let Some(hook) = hook {
            hook.await;
        }
    }
}

#[async_trait]
impl KeyValueStore for InterleavingStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value = self.inner.get(key).await?;
        if value.is_none() {
            Self::fire(&self.after_get_miss).await;
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.inner.set_with_ttl(key, value, ttl).await
    }

    async fn set_nx(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        self.inner.set_nx(key, value).await
    }

    async fn set_nx_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.inner.set_nx_with_ttl(key, value, ttl).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.exists(key).await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.inner.incr(key).await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value = self.inner.hget(key, field).await?;
        if value.is_none() {
            Self::fire(&self.after_hget_miss).await;
        }
        Ok(value)
    }

    async fn hset(&self, key: &str, field: &str, value: &[u8]) -> Result<(), StoreError> {
        self.inner.hset(key, field, value).await
    }

    async fn hset_nx(&self, key: &str, field: &str, value: &[u8]) -> Result<bool, StoreError> {
        self.inner.hset_nx(key, field, value).await
    }

    async fn hincr(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        self.inner.hincr(key, field, delta).await
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.inner.hdel(key, field).await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, Vec<u8>>, StoreError> {
        self.inner.hgetall(key).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }

    fn name(&self) -> &str {
        "interleaving"
    }
}
