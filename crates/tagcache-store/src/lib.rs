//! # tagcache store
//!
//! Backing key-value store abstraction for tagcache.
//!
//! The invalidation layer never owns data itself: payloads, counters and
//! tag metadata all live in a store reached through [`KeyValueStore`].
//!
//! ## Features
//!
//! - Async trait-based store abstraction (strings with expiry, counters, hashes)
//! - `MemoryStore` for tests and single-process deployments
//! - `RedisStore` behind the `redis` cargo feature
//! - `StoreConfig` and [`connect`] to bootstrap a store from configuration
//!
//! ## Example
//!
//! ```ignore
//! use tagcache_store::{connect, StoreConfig};
//!
//! let config = StoreConfig::builder()
//!     .redis("redis://127.0.0.1:6379")
//!     .build()?;
//!
//! let store = connect(&config).await?;
//! store.health_check().await?;
//! ```

pub mod config;
pub mod connector;
pub mod error;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod traits;

// Re-exports
pub use config::{StoreBackend, StoreConfig, StoreConfigBuilder};
pub use connector::connect;
pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
pub use traits::{KeyValueStore, parse_counter};

// Re-export tagcache_core for consumers
pub use tagcache_core;
