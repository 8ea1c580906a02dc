//! tagcache core - Domain types and errors
//!
//! This crate provides the foundational types shared by the tagcache
//! store adapters, the invalidation core and the HTTP server.

pub mod error;
pub mod keyspace;
pub mod types;

pub use error::{Result, TagCacheError};
pub use types::{CleanMode, CompositeKey, Epoch, Tag, TagSet};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
