//! Turns a [`StoreConfig`] into a live store handle.

use std::sync::Arc;

use tracing::info;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::traits::KeyValueStore;

/// Connects to the store described by `config`.
///
/// The returned store has not been health-checked yet; callers decide
/// what an unreachable store means for them.
///
/// # Errors
///
/// - `StoreError::InvalidConfig` if the configuration is incomplete
/// - `StoreError::Unavailable` if the backend cannot be reached or is not compiled in
/// - `StoreError::Timeout` if connecting exceeds the configured timeout
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    config.validate()?;

    match config.backend() {
        StoreBackend::Memory => {
            info!("Using in-process memory store");
            Ok(Arc::new(MemoryStore::new()))
        },
        StoreBackend::Redis => connect_redis(config).await,
    }
}

#[cfg(feature = "redis")]
async fn connect_redis(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    let url = config
        .url()
        .ok_or_else(|| StoreError::InvalidConfig("url is required".to_string()))?;
    let timeout = config.connect_timeout();

    info!(url = %url, "Connecting to redis");
    let store = tokio::time::timeout(timeout, crate::redis_store::RedisStore::connect(url))
        .await
        .map_err(|_| StoreError::Timeout {
            seconds: timeout.as_secs(),
        })??;

    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(_config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    Err(StoreError::unavailable(
        "redis backend requested but the `redis` feature is disabled",
    ))
}
