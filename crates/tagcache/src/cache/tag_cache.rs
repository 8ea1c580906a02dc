//! The cache facade.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tagcache_core::keyspace::{DEFAULT_TTL_SECS, MAX_TTL_SECS};
use tagcache_core::{CompositeKey, Result, TagCacheError, TagSet};
use tagcache_store::KeyValueStore;
use tracing::{debug, warn};

use super::builder::TagCacheBuilder;
use super::state::ConnectionState;
use crate::codec::{Codec, JsonCodec};
use crate::gc::{GarbageCollector, GcHandle, GcOutcome, GcScheduler, GcStats};
use crate::keys::KeyDeriver;
use crate::metrics::CacheMetrics;
use crate::namespace::NamespaceController;

/// Everything a connected facade talks to.
#[derive(Debug)]
pub(crate) struct Connection {
    pub(crate) store: Arc<dyn KeyValueStore>,
    pub(crate) namespace: NamespaceController,
    pub(crate) deriver: KeyDeriver,
    pub(crate) gc: GarbageCollector,
}

/// Whether operations reach a store at all.
#[derive(Debug)]
pub(crate) enum Backend {
    /// Every operation is a no-op.
    Disabled,
    Connected(Connection),
}

/// Tag-aware cache over a shared key-value store.
///
/// Entries are stored under composite keys derived from the namespace
/// epoch, the prefix, the logical key and the versions of the entry's
/// tags. Invalidation bumps an epoch or tag versions so old keys are never
/// derived again; the orphaned entries expire through their TTL.
///
/// A facade whose store failed its health check is permanently disabled:
/// `save` returns `Ok(false)`, `load` misses and `clean` does nothing.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tagcache::{TagCache, TagSet};
/// use tagcache_store::MemoryStore;
///
/// # #[tokio::main]
/// # async fn main() -> tagcache::Result<()> {
/// let cache = TagCache::builder()
///     .connect(Arc::new(MemoryStore::new()))
///     .await?;
///
/// let tags = TagSet::from_iter(["user:42"]);
/// cache.save("v1", "profile", &tags, None).await?;
/// let value: Option<String> = cache.load("profile", &tags).await;
/// assert_eq!(value.as_deref(), Some("v1"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TagCache<C: Codec = JsonCodec> {
    pub(crate) backend: Backend,
    pub(crate) state: ConnectionState,
    pub(crate) prefix: RwLock<String>,
    pub(crate) default_ttl: Duration,
    pub(crate) codec: C,
    pub(crate) metrics: CacheMetrics,
    pub(crate) gc_stats: Arc<GcStats>,
}

impl TagCache<JsonCodec> {
    /// Creates a builder with default settings and the JSON codec.
    pub fn builder() -> TagCacheBuilder<JsonCodec> {
        TagCacheBuilder::new()
    }

    /// A facade that never touches a store.
    pub fn disabled() -> Self {
        TagCacheBuilder::new().disabled()
    }
}

impl<C: Codec> TagCache<C> {
    /// Stores `value` under `key`, depending on `tags`.
    ///
    /// `ttl` defaults to the configured default TTL. Returns the store's
    /// write acknowledgment, or `false` when the cache is disabled.
    ///
    /// # Errors
    ///
    /// Store failures, values that cannot be encoded, and a TTL that is
    /// zero or longer than a year.
    pub async fn save<T>(
        &self,
        value: &T,
        key: &str,
        tags: &TagSet,
        ttl: Option<Duration>,
    ) -> Result<bool>
    where
        T: Serialize + ?Sized,
    {
        let Backend::Connected(conn) = &self.backend else {
            debug!(key = %key, "Cache disabled, save skipped");
            return Ok(false);
        };

        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl.is_zero() {
            return Err(TagCacheError::invalid_config("ttl", "must be positive"));
        }
        if ttl > Duration::from_secs(MAX_TTL_SECS) {
            return Err(TagCacheError::invalid_config(
                "ttl",
                format!("must not exceed {}s", MAX_TTL_SECS),
            ));
        }
        if ttl > conn.gc.config().stale_after() {
            warn!(
                key = %key,
                ttl_secs = ttl.as_secs(),
                "TTL exceeds the tag staleness threshold; the entry may outlive its tags"
            );
        }

        let _timer = self.metrics.start_timer("save");
        let composite = self.derive(conn, key, tags).await?;
        let payload = self.codec.encode(value)?;

        let acknowledged = conn
            .store
            .set_with_ttl(composite.as_str(), &payload, ttl)
            .await
            .map_err(|e| e.during("set"))?;

        self.metrics.record_save();
        debug!(
            key = %key,
            tags = %tags,
            composite = %composite,
            bytes = payload.len(),
            ttl_secs = ttl.as_secs(),
            "Entry saved"
        );
        Ok(acknowledged)
    }

    /// Loads the value stored under `key` for the current tag versions.
    ///
    /// Absent entries, undecodable payloads and store failures are all
    /// misses; failures are logged.
    pub async fn load<T: DeserializeOwned>(&self, key: &str, tags: &TagSet) -> Option<T> {
        let Backend::Connected(conn) = &self.backend else {
            self.metrics.record_miss();
            return None;
        };

        let _timer = self.metrics.start_timer("load");
        match self.try_load(conn, key, tags).await {
            Ok(Some(value)) => {
                self.metrics.record_hit();
                Some(value)
            },
            Ok(None) => {
                debug!(key = %key, tags = %tags, "Cache miss");
                self.metrics.record_miss();
                None
            },
            Err(e) => {
                warn!(key = %key, error = %e, "Load failed, reporting a miss");
                self.metrics.record_miss();
                None
            },
        }
    }

    /// Loads `key`, or computes it with `init` and saves the result.
    ///
    /// A failed save is logged and the computed value is still returned.
    ///
    /// # Errors
    ///
    /// Only errors returned by `init`.
    pub async fn get_or_save_with<T, F, Fut>(
        &self,
        key: &str,
        tags: &TagSet,
        ttl: Option<Duration>,
        init: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(cached) = self.load(key, tags).await {
            return Ok(cached);
        }

        let value = init().await?;
        if let Err(e) = self.save(&value, key, tags, ttl).await {
            warn!(key = %key, error = %e, "Failed to save computed value");
        }
        Ok(value)
    }

    /// The composite key `key` and `tags` map to right now.
    ///
    /// Like `load`, this reads (and so touches) every tag. Returns `None`
    /// when the cache is disabled.
    pub async fn composite_key(&self, key: &str, tags: &TagSet) -> Result<Option<CompositeKey>> {
        match &self.backend {
            Backend::Disabled => Ok(None),
            Backend::Connected(conn) => self.derive(conn, key, tags).await.map(Some),
        }
    }

    /// Sets the prefix used by all subsequent derivations.
    ///
    /// Independent logical caches sharing one store use distinct prefixes.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        debug!(prefix = %prefix, "Cache prefix changed");
        *self.prefix.write() = prefix;
    }

    pub fn prefix(&self) -> String {
        self.prefix.read().clone()
    }

    /// Runs a marker-gated garbage collection now.
    ///
    /// Returns `Skipped` when disabled or when another run holds the window.
    pub async fn collect_garbage(&self) -> Result<GcOutcome> {
        match &self.backend {
            Backend::Disabled => Ok(GcOutcome::Skipped),
            Backend::Connected(conn) => conn.gc.run().await,
        }
    }

    /// Starts periodic garbage collection on the current tokio runtime.
    ///
    /// Returns `None` when the cache is disabled. Collection stops when
    /// the handle is dropped.
    pub fn start_gc_scheduler(&self) -> Option<GcHandle> {
        match &self.backend {
            Backend::Disabled => None,
            Backend::Connected(conn) => Some(GcScheduler::new(conn.gc.clone()).start()),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.backend, Backend::Connected(_))
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    pub fn gc_stats(&self) -> &GcStats {
        &self.gc_stats
    }

    /// Name of the backing store, if connected.
    pub fn store_name(&self) -> Option<&str> {
        match &self.backend {
            Backend::Disabled => None,
            Backend::Connected(conn) => Some(conn.store.name()),
        }
    }

    async fn derive(&self, conn: &Connection, key: &str, tags: &TagSet) -> Result<CompositeKey> {
        // Read the prefix before awaiting; the lock guard is not Send.
        let prefix = self.prefix();
        let epoch = conn.namespace.current().await?;
        conn.deriver.derive(epoch, &prefix, key, tags).await
    }

    async fn try_load<T: DeserializeOwned>(
        &self,
        conn: &Connection,
        key: &str,
        tags: &TagSet,
    ) -> Result<Option<T>> {
        let composite = self.derive(conn, key, tags).await?;
        let Some(payload) = conn
            .store
            .get(composite.as_str())
            .await
            .map_err(|e| e.during("get"))?
        else {
            return Ok(None);
        };

        match self.codec.decode(&payload) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(composite = %composite, error = %e, "Undecodable payload");
                Ok(None)
            },
        }
    }
}

impl Default for TagCache<JsonCodec> {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Default TTL used when none is configured.
pub(crate) fn default_ttl() -> Duration {
    Duration::from_secs(DEFAULT_TTL_SECS)
}
