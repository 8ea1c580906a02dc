//! Per-tag version counters and last-touched timestamps.

use std::sync::Arc;

use tagcache_core::keyspace::{INITIAL_TAG_VERSION, TAGS_KEY, TIME_KEY};
use tagcache_core::{Result, Tag, TagCacheError, TagSet};
use tagcache_store::{KeyValueStore, parse_counter};
use tracing::debug;

use crate::clock::Clock;

/// Version counters for tags, persisted in the backing store.
///
/// Two hashes back this store: `TAGS` (tag -> version) and `TIME`
/// (tag -> unix seconds of last use). They are updated independently;
/// timestamps only gate garbage collection, never key derivation.
///
/// Cloning is cheap and clones share the same store.
#[derive(Debug, Clone)]
pub struct TagVersionStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl TagVersionStore {
    /// Creates a version store over `store`, stamping times with `clock`.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Reads a tag's version and refreshes its last-touched time.
    ///
    /// This is one combined operation: every read counts as use, which
    /// keeps tags that live keys depend on out of reach of garbage
    /// collection. An unseen tag is initialized to version 1 only if no
    /// other writer created the field in the meantime; a bump that lands
    /// between the miss and the initialization is never overwritten.
    pub async fn get_version(&self, tag: &Tag) -> Result<u64> {
        let version = match self.read_version(tag).await? {
            Some(version) => version,
            None => self.initialize(tag).await?,
        };

        self.touch(tag).await?;
        Ok(version)
    }

    async fn read_version(&self, tag: &Tag) -> Result<Option<u64>> {
        let raw = self
            .store
            .hget(TAGS_KEY, tag.as_str())
            .await
            .map_err(|e| e.during("hget"))?;
        match raw {
            Some(raw) => Ok(Some(to_version(tag, parse_counter(TAGS_KEY, &raw)?)?)),
            None => Ok(None),
        }
    }

    async fn initialize(&self, tag: &Tag) -> Result<u64> {
        let created = self
            .store
            .hset_nx(
                TAGS_KEY,
                tag.as_str(),
                INITIAL_TAG_VERSION.to_string().as_bytes(),
            )
            .await
            .map_err(|e| e.during("hsetnx"))?;

        if created {
            debug!(tag = %tag, "Initialized tag version");
            return Ok(INITIAL_TAG_VERSION);
        }

        // Lost to a concurrent writer; its value wins. A field that vanished
        // again (forgotten by GC) reads as the initial version.
        Ok(self
            .read_version(tag)
            .await?
            .unwrap_or(INITIAL_TAG_VERSION))
    }

    /// Atomically increments a tag's version and returns the new value.
    ///
    /// An unseen tag counts as being at version 1, so its first bump
    /// returns 2. Entries derived before the tag was forgotten by garbage
    /// collection used version 1 or later, and must not match afterwards.
    pub async fn bump_version(&self, tag: &Tag) -> Result<u64> {
        let mut version = self
            .store
            .hincr(TAGS_KEY, tag.as_str(), 1)
            .await
            .map_err(|e| e.during("hincr"))?;

        if version == INITIAL_TAG_VERSION as i64 {
            version = self
                .store
                .hincr(TAGS_KEY, tag.as_str(), 1)
                .await
                .map_err(|e| e.during("hincr"))?;
        }

        self.touch(tag).await?;
        debug!(tag = %tag, version = version, "Tag version bumped");
        to_version(tag, version)
    }

    /// Reads the version of every tag in the set, in set order.
    pub async fn versions(&self, tags: &TagSet) -> Result<Vec<(Tag, u64)>> {
        let mut versions = Vec::with_capacity(tags.len());
        for tag in tags {
            versions.push((tag.clone(), self.get_version(tag).await?));
        }
        Ok(versions)
    }

    /// Returns when the tag was last read or bumped, without touching it.
    pub async fn last_touched(&self, tag: &Tag) -> Result<Option<u64>> {
        let raw = self
            .store
            .hget(TIME_KEY, tag.as_str())
            .await
            .map_err(|e| e.during("hget"))?;
        Ok(raw.and_then(|raw| parse_timestamp(&raw)))
    }

    /// Deletes both the version and the timestamp of a tag.
    ///
    /// Returns true if a version was present.
    pub async fn forget(&self, tag: &str) -> Result<bool> {
        let had_version = self
            .store
            .hdel(TAGS_KEY, tag)
            .await
            .map_err(|e| e.during("hdel"))?;
        self.store
            .hdel(TIME_KEY, tag)
            .await
            .map_err(|e| e.during("hdel"))?;
        Ok(had_version)
    }

    /// The clock timestamps are taken from.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    async fn touch(&self, tag: &Tag) -> Result<()> {
        let now = self.clock.now();
        self.store
            .hset(TIME_KEY, tag.as_str(), now.to_string().as_bytes())
            .await
            .map_err(|e| e.during("hset"))?;
        Ok(())
    }
}

/// Parses a `TIME` entry. Returns None for anything that is not unix seconds.
pub(crate) fn parse_timestamp(raw: &[u8]) -> Option<u64> {
    std::str::from_utf8(raw).ok()?.trim().parse().ok()
}

fn to_version(tag: &Tag, raw: i64) -> Result<u64> {
    u64::try_from(raw)
        .ok()
        .filter(|v| *v >= INITIAL_TAG_VERSION)
        .ok_or_else(|| {
            TagCacheError::internal(format!("tag '{}' has invalid version {}", tag, raw))
        })
}
