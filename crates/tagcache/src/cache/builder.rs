//! Facade construction and connection.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tagcache_core::{Result, TagCacheError};
use tagcache_store::{KeyValueStore, StoreConfig};
use tracing::{debug, info, warn};

use super::state::ConnectionState;
use super::tag_cache::{Backend, Connection, TagCache, default_ttl};
use crate::clock::{Clock, SystemClock};
use crate::codec::{Codec, JsonCodec};
use crate::config::{GcConfig, TagCacheConfig};
use crate::gc::{GarbageCollector, GcOutcome, GcStats};
use crate::keys::KeyDeriver;
use crate::metrics::CacheMetrics;
use crate::namespace::NamespaceController;
use crate::tags::TagVersionStore;

/// Builder for [`TagCache`].
///
/// Connecting never fails because the store is unreachable: such a facade
/// is built in the `Failed` state and behaves as a no-op cache. Only
/// invalid settings are errors.
#[derive(Debug)]
pub struct TagCacheBuilder<C: Codec = JsonCodec> {
    prefix: String,
    default_ttl: Duration,
    gc: GcConfig,
    clock: Arc<dyn Clock>,
    codec: C,
    metrics: CacheMetrics,
}

impl TagCacheBuilder<JsonCodec> {
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
            default_ttl: default_ttl(),
            gc: GcConfig::default(),
            clock: Arc::new(SystemClock),
            codec: JsonCodec::default(),
            metrics: CacheMetrics::new(),
        }
    }
}

impl Default for TagCacheBuilder<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> TagCacheBuilder<C> {
    /// Applies prefix, default TTL and GC settings from a config.
    pub fn from_config(self, config: &TagCacheConfig) -> Self {
        self.prefix(config.prefix.clone())
            .default_ttl(config.default_ttl())
            .gc(config.gc.clone())
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn gc(mut self, gc: GcConfig) -> Self {
        self.gc = gc;
        self
    }

    /// Sets the clock tag timestamps are taken from.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Shares a metrics recorder, e.g. with another facade.
    pub fn metrics(mut self, metrics: CacheMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replaces the payload codec.
    pub fn codec<D: Codec>(self, codec: D) -> TagCacheBuilder<D> {
        TagCacheBuilder {
            prefix: self.prefix,
            default_ttl: self.default_ttl,
            gc: self.gc,
            clock: self.clock,
            codec,
            metrics: self.metrics,
        }
    }

    /// Connects to an existing store.
    ///
    /// Health-checks the store; on success runs one garbage collection
    /// pass, whose failure is only logged.
    ///
    /// # Errors
    ///
    /// `TagCacheError::InvalidConfig` for invalid settings.
    pub async fn connect(self, store: Arc<dyn KeyValueStore>) -> Result<TagCache<C>> {
        self.validate()?;

        let mut state = ConnectionState::Disconnected;
        transition(&mut state, ConnectionState::Connecting);
        debug!(store = store.name(), "Connecting to backing store");

        if let Err(e) = store.health_check().await {
            let failure = TagCacheError::connection_failure(store.name(), e.to_string());
            warn!(error = %failure, "Backing store unavailable, cache disabled");
            transition(&mut state, ConnectionState::Failed(failure.to_string()));
            return Ok(self.finish(Backend::Disabled, state));
        }

        let stats = Arc::new(GcStats::new());
        let tags = TagVersionStore::new(store.clone(), self.clock.clone());
        let gc = GarbageCollector::new(
            tags.clone(),
            store.clone(),
            self.gc.clone(),
            stats,
            self.metrics.clone(),
        );

        match gc.run().await {
            Ok(GcOutcome::Skipped) => debug!("Garbage collection ran recently, skipped"),
            Ok(GcOutcome::Swept(report)) => {
                debug!(evicted = report.evicted.len(), "Garbage collection on connect")
            },
            Err(e) => warn!(error = %e, "Garbage collection on connect failed"),
        }

        transition(&mut state, ConnectionState::Connected);
        info!(store = store.name(), prefix = %self.prefix, "Cache connected");

        let connection = Connection {
            namespace: NamespaceController::new(store.clone()),
            deriver: KeyDeriver::new(tags),
            gc,
            store,
        };
        Ok(self.finish(Backend::Connected(connection), state))
    }

    /// Connects to the store described by `config`.
    ///
    /// A store that cannot be created or reached yields a `Failed` facade.
    ///
    /// # Errors
    ///
    /// `TagCacheError::InvalidConfig` for invalid settings.
    pub async fn connect_with(self, config: &StoreConfig) -> Result<TagCache<C>> {
        self.validate()?;

        match tagcache_store::connect(config).await {
            Ok(store) => self.connect(store).await,
            Err(e) => {
                let failure = TagCacheError::connection_failure(config.endpoint(), e.to_string());
                warn!(error = %failure, "Backing store unavailable, cache disabled");
                let mut state = ConnectionState::Disconnected;
                transition(&mut state, ConnectionState::Connecting);
                transition(&mut state, ConnectionState::Failed(failure.to_string()));
                Ok(self.finish(Backend::Disabled, state))
            },
        }
    }

    /// Builds a facade that never touches a store.
    pub fn disabled(self) -> TagCache<C> {
        self.finish(Backend::Disabled, ConnectionState::Disconnected)
    }

    fn validate(&self) -> Result<()> {
        if self.default_ttl.is_zero() {
            return Err(TagCacheError::invalid_config(
                "default_ttl",
                "must be positive",
            ));
        }
        self.gc.validate()?;
        // Garbage collection resets forgotten tags to version 1; entries
        // must expire before their tags can be forgotten.
        if self.default_ttl > self.gc.stale_after() {
            return Err(TagCacheError::invalid_config(
                "default_ttl",
                "must not exceed gc.stale_after_secs",
            ));
        }
        Ok(())
    }

    fn finish(self, backend: Backend, state: ConnectionState) -> TagCache<C> {
        let gc_stats = match &backend {
            Backend::Connected(conn) => conn.gc.stats().clone(),
            Backend::Disabled => Arc::new(GcStats::new()),
        };
        TagCache {
            backend,
            state,
            prefix: RwLock::new(self.prefix),
            default_ttl: self.default_ttl,
            codec: self.codec,
            metrics: self.metrics,
            gc_stats,
        }
    }
}

fn transition(state: &mut ConnectionState, next: ConnectionState) {
    debug_assert!(
        state.can_transition_to(&next),
        "illegal transition {} -> {}",
        state,
        next
    );
    debug!(from = state.label(), to = next.label(), "Connection state changed");
    *state = next;
}
