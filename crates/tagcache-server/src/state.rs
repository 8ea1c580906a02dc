//! Application state.

use std::sync::Arc;

use tagcache::TagCache;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    cache: Arc<TagCache>,
}

impl AppState {
    /// Creates a new AppState owning the given cache.
    pub fn new(cache: TagCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates an AppState from a cache shared with other components.
    pub fn from_shared(cache: Arc<TagCache>) -> Self {
        Self { cache }
    }

    /// Returns a reference to the cache facade.
    pub fn cache(&self) -> &TagCache {
        self.cache.as_ref()
    }

    /// Returns the shared handle, e.g. for background tasks.
    pub fn shared_cache(&self) -> Arc<TagCache> {
        Arc::clone(&self.cache)
    }
}
