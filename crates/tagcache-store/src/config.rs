//! Backing store configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Which store implementation to connect to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process map, not shared between processes.
    #[default]
    Memory,
    /// Redis server (requires the `redis` feature).
    Redis,
}

/// Configuration for the backing store connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store implementation.
    #[serde(default)]
    backend: StoreBackend,

    /// Connection URL, required for remote backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,

    /// Timeout for establishing the connection, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl StoreConfig {
    /// Creates a new builder for StoreConfig.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Configuration for an in-process store.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Returns the backend kind.
    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    /// Returns the connection URL.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Returns the connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns a name for logs: the URL for remote stores, the backend otherwise.
    pub fn endpoint(&self) -> &str {
        match (&self.backend, self.url.as_deref()) {
            (_, Some(url)) => url,
            (StoreBackend::Memory, None) => "memory",
            (StoreBackend::Redis, None) => "redis",
        }
    }

    /// Checks the combination of fields is usable.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.backend == StoreBackend::Redis && self.url.is_none() {
            return Err(StoreError::InvalidConfig(
                "url is required for the redis backend".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(StoreError::InvalidConfig(
                "connect_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for StoreConfig.
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    backend: StoreBackend,
    url: Option<String>,
    connect_timeout: Option<Duration>,
}

impl StoreConfigBuilder {
    /// Sets the backend kind.
    pub fn backend(mut self, backend: StoreBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Uses Redis at the given URL.
    pub fn redis(mut self, url: impl Into<String>) -> Self {
        self.backend = StoreBackend::Redis;
        self.url = Some(url.into());
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<StoreConfig, StoreError> {
        let config = StoreConfig {
            backend: self.backend,
            url: self.url,
            connect_timeout_secs: self
                .connect_timeout
                .map(|t| t.as_secs())
                .unwrap_or_else(default_connect_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }
}
