//! Cache facade.
//!
//! [`TagCache`] composes namespace epochs, tag versions, key derivation
//! and garbage collection into a save/load/clean surface over a
//! [`KeyValueStore`](tagcache_store::KeyValueStore).

mod builder;
mod invalidation;
mod state;
mod tag_cache;

// Re-exports
pub use builder::TagCacheBuilder;
pub use invalidation::{BumpedTag, InvalidationResult};
pub use state::ConnectionState;
pub use tag_cache::TagCache;
