//! The global namespace epoch.

use std::sync::Arc;

use rand::Rng;
use tagcache_core::keyspace::NAMESPACE_KEY;
use tagcache_core::{Epoch, Result, TagCacheError};
use tagcache_store::{KeyValueStore, parse_counter};
use tracing::{debug, info};

/// Upper bound of the random value a fresh namespace starts at.
const SEED_MAX: u64 = 1_000_000;

/// Controls the epoch every composite key embeds.
///
/// Bumping the epoch orphans every key derived under the previous value
/// in one atomic step. Orphaned entries are never deleted here; the
/// store expires them through their TTL.
#[derive(Debug, Clone)]
pub struct NamespaceController {
    store: Arc<dyn KeyValueStore>,
}

impl NamespaceController {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the current epoch, seeding it if the store has none.
    ///
    /// The seed is random so that a store which lost its `NAMESPACE` key
    /// (eviction, restart without persistence) does not restart at a
    /// value that earlier, still-live keys were derived under. The seed is
    /// written only if the key is still absent, so a peer's seed (and any
    /// flush on top of it) is never replaced.
    pub async fn current(&self) -> Result<Epoch> {
        if let Some(epoch) = self.read().await? {
            return Ok(epoch);
        }

        let seed = rand::thread_rng().gen_range(1..=SEED_MAX);
        let created = self
            .store
            .set_nx(NAMESPACE_KEY, seed.to_string().as_bytes())
            .await
            .map_err(|e| e.during("setnx"))?;

        if created {
            info!(epoch = seed, "Seeded namespace epoch");
            return Ok(Epoch::new(seed));
        }

        self.read().await?.ok_or_else(|| {
            TagCacheError::internal("namespace epoch vanished right after seeding")
        })
    }

    async fn read(&self) -> Result<Option<Epoch>> {
        let raw = self
            .store
            .get(NAMESPACE_KEY)
            .await
            .map_err(|e| e.during("get"))?;
        match raw {
            Some(raw) => Ok(Some(to_epoch(parse_counter(NAMESPACE_KEY, &raw)?)?)),
            None => Ok(None),
        }
    }

    /// Atomically advances the epoch and returns the new value.
    pub async fn bump_all(&self) -> Result<Epoch> {
        // Seed first so the increment never starts from zero.
        self.current().await?;

        let next = self
            .store
            .incr(NAMESPACE_KEY)
            .await
            .map_err(|e| e.during("incr"))?;
        debug!(epoch = next, "Namespace epoch bumped");
        to_epoch(next)
    }
}

fn to_epoch(raw: i64) -> Result<Epoch> {
    u64::try_from(raw)
        .map(Epoch::new)
        .map_err(|_| TagCacheError::internal(format!("namespace epoch {} is negative", raw)))
}
