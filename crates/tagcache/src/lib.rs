//! # tagcache
//!
//! Tag-aware cache invalidation over a shared key-value store.
//!
//! Entries are never deleted to invalidate them. Each entry lives under a
//! composite key derived from a global namespace epoch and the versions of
//! the tags it depends on; bumping the epoch or a tag version makes the
//! old keys unreachable and the store's TTL reclaims them.
//!
//! ## Features
//!
//! - `save`/`load` keyed by logical key plus tag set
//! - Whole-cache flush (epoch bump) and per-tag invalidation (version bump)
//! - Marker-gated garbage collection of idle tag metadata, on connect or scheduled
//! - Disabled mode: an unreachable store turns the cache into a no-op
//! - JSON payloads with zlib compression, behind a `Codec` trait
//!
//! ## Example
//!
//! ```ignore
//! use tagcache::{CleanMode, TagCache, TagSet};
//! use tagcache_store::StoreConfig;
//!
//! let cache = TagCache::builder()
//!     .prefix("shop")
//!     .connect_with(&StoreConfig::builder().redis("redis://127.0.0.1:6379").build()?)
//!     .await?;
//!
//! let tags = TagSet::from_iter(["user:42"]);
//! cache.save(&profile, "profile", &tags, Some(Duration::from_secs(60))).await?;
//! cache.clean(CleanMode::matching_tag(["user:42"])).await?;
//! assert!(cache.load::<Profile>("profile", &tags).await.is_none());
//! ```

pub mod cache;
pub mod clock;
pub mod codec;
pub mod config;
pub mod gc;
pub mod keys;
pub mod metrics;
pub mod namespace;
pub mod tags;

// Re-exports
pub use cache::{BumpedTag, ConnectionState, InvalidationResult, TagCache, TagCacheBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{Codec, JsonCodec};
pub use config::{GcConfig, TagCacheConfig};
pub use gc::{GarbageCollector, GcHandle, GcOutcome, GcReport, GcScheduler, GcStats};
pub use keys::{KeyDeriver, compose};
pub use metrics::{CacheMetrics, register_cache_metrics};
pub use namespace::NamespaceController;
pub use tags::TagVersionStore;

// Re-export the shared domain types
pub use tagcache_core::{
    CleanMode, CompositeKey, Epoch, Result, Tag, TagCacheError, TagSet, keyspace,
};
pub use tagcache_store;
