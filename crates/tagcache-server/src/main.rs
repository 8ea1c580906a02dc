//! tagcache server binary.

use anyhow::Context;
use tagcache::TagCache;
use tagcache_server::{AppState, Settings, metrics::init_metrics, run_server};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load().context("failed to load settings")?;
    let addr = settings.server.addr()?;

    tracing::info!("Starting tagcache server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Store: {}", settings.cache.store.endpoint());
    tracing::info!("Prefix: '{}'", settings.cache.prefix);

    let prometheus = init_metrics().context("failed to install metrics recorder")?;

    // An unreachable store is not fatal: the cache runs disabled.
    let cache = TagCache::builder()
        .from_config(&settings.cache)
        .connect_with(&settings.cache.store)
        .await
        .context("invalid cache settings")?;

    if cache.is_connected() {
        tracing::info!("Cache connected");
    } else {
        tracing::warn!(state = %cache.state(), "Cache disabled, serving misses");
    }

    let state = AppState::new(cache);
    let _gc = state.cache().start_gc_scheduler();

    run_server(addr, state, prometheus).await?;

    Ok(())
}
