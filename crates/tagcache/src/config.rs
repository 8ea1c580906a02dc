//! Cache and garbage collection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tagcache_core::keyspace::{
    DEFAULT_REFRESH_WINDOW_SECS, DEFAULT_STALE_AFTER_SECS, DEFAULT_TTL_SECS,
};
use tagcache_core::{Result, TagCacheError};
use tagcache_store::StoreConfig;

/// Configuration for tag metadata garbage collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcConfig {
    /// Minimum time between two sweeps across all instances, in seconds.
    /// Also the TTL of the marker key and the scheduler period.
    #[serde(default = "default_refresh_window_secs")]
    pub refresh_window_secs: u64,

    /// Idle time after which a tag is forgotten, in seconds.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

fn default_refresh_window_secs() -> u64 {
    DEFAULT_REFRESH_WINDOW_SECS
}

fn default_stale_after_secs() -> u64 {
    DEFAULT_STALE_AFTER_SECS
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            refresh_window_secs: DEFAULT_REFRESH_WINDOW_SECS,
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
        }
    }
}

impl GcConfig {
    pub fn refresh_window(&self) -> Duration {
        Duration::from_secs(self.refresh_window_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_window_secs == 0 {
            return Err(TagCacheError::invalid_config(
                "gc.refresh_window_secs",
                "must be positive",
            ));
        }
        if self.stale_after_secs == 0 {
            return Err(TagCacheError::invalid_config(
                "gc.stale_after_secs",
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Top-level cache configuration, usually read from a settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagCacheConfig {
    /// Separator for independent logical caches sharing one store.
    pub prefix: String,

    /// TTL applied when `save` is called without one, in seconds.
    pub default_ttl_secs: u64,

    /// Garbage collection settings.
    pub gc: GcConfig,

    /// Backing store connection.
    pub store: StoreConfig,
}

impl Default for TagCacheConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            default_ttl_secs: DEFAULT_TTL_SECS,
            gc: GcConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl TagCacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl_secs == 0 {
            return Err(TagCacheError::invalid_config(
                "default_ttl_secs",
                "must be positive",
            ));
        }
        self.gc.validate()?;
        if self.default_ttl_secs > self.gc.stale_after_secs {
            return Err(TagCacheError::invalid_config(
                "default_ttl_secs",
                "must not exceed gc.stale_after_secs",
            ));
        }
        self.store
            .validate()
            .map_err(|e| TagCacheError::invalid_config("store", e.to_string()))
    }
}
