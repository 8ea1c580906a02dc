//! Server settings.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. the file named by `TAGCACHE_CONFIG` (any format the `config` crate
//!    reads, picked by extension)
//! 3. environment variables `TAGCACHE__<SECTION>__<FIELD>`, e.g.
//!    `TAGCACHE__SERVER__PORT=9000` or `TAGCACHE__CACHE__GC__STALE_AFTER_SECS=3600`

use std::net::{IpAddr, SocketAddr};

use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;
use tagcache::TagCacheConfig;

/// Environment variable naming an optional settings file.
pub const CONFIG_PATH_ENV: &str = "TAGCACHE_CONFIG";

/// Prefix of settings environment variables.
pub const ENV_PREFIX: &str = "TAGCACHE";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub cache: TagCacheConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// IP address to bind.
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    /// Socket address to bind.
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| ConfigError::Message(format!("server.host '{}': {}", self.host, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Settings {
    /// Loads settings from the optional file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            tracing::info!(path = %path, "Loading settings file");
            builder = builder.add_source(File::with_name(&path));
        }

        Self::from_builder(builder.add_source(environment()))
    }

    /// Deserializes and validates whatever `builder` collected.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings
            .cache
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        settings.server.addr()?;
        Ok(settings)
    }
}

/// Environment source for settings.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}
