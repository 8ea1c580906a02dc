//! Invalidation by orphaning.

use serde::Serialize;
use tagcache_core::{CleanMode, Epoch, Result, Tag};
use tracing::{debug, info};

use super::tag_cache::{Backend, TagCache};
use crate::codec::Codec;

/// A tag and the version it was bumped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BumpedTag {
    pub tag: Tag,
    pub version: u64,
}

/// Result of a `clean` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidationResult {
    /// Mode label (`flush_all` or `invalidate_tags`).
    pub mode: &'static str,
    /// False when nothing was bumped: disabled cache or empty tag set.
    pub applied: bool,
    /// The new epoch, for a flush.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epoch: Option<Epoch>,
    /// New versions, for tag invalidation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<BumpedTag>,
}

impl InvalidationResult {
    fn not_applied(mode: &CleanMode) -> Self {
        Self {
            mode: mode.label(),
            applied: false,
            epoch: None,
            tags: Vec::new(),
        }
    }
}

impl<C: Codec> TagCache<C> {
    /// Invalidates entries without touching them.
    ///
    /// `FlushAll` advances the namespace epoch, orphaning every entry.
    /// `InvalidateTags` bumps each listed tag, orphaning every entry that
    /// depends on at least one of them. Stored payloads stay in place until
    /// their TTL expires.
    ///
    /// # Errors
    ///
    /// Store failures. A disabled cache returns a result with
    /// `applied == false`.
    pub async fn clean(&self, mode: CleanMode) -> Result<InvalidationResult> {
        let Backend::Connected(conn) = &self.backend else {
            debug!(mode = mode.label(), "Cache disabled, clean skipped");
            return Ok(InvalidationResult::not_applied(&mode));
        };

        let _timer = self.metrics.start_timer("clean");
        let result = match &mode {
            CleanMode::FlushAll => {
                let epoch = conn.namespace.bump_all().await?;
                info!(epoch = %epoch, "Cache flushed");
                InvalidationResult {
                    mode: mode.label(),
                    applied: true,
                    epoch: Some(epoch),
                    tags: Vec::new(),
                }
            },
            CleanMode::InvalidateTags(tags) => {
                let versions = conn.deriver.tag_versions();
                let mut bumped = Vec::with_capacity(tags.len());
                for tag in tags {
                    let version = versions.bump_version(tag).await?;
                    bumped.push(BumpedTag {
                        tag: tag.clone(),
                        version,
                    });
                }
                info!(tags = %tags, "Tags invalidated");
                InvalidationResult {
                    mode: mode.label(),
                    applied: !bumped.is_empty(),
                    epoch: None,
                    tags: bumped,
                }
            },
        };

        if result.applied {
            self.metrics.record_invalidation(result.mode);
        }
        Ok(result)
    }

    /// Shorthand for `clean(CleanMode::FlushAll)`.
    pub async fn flush_all(&self) -> Result<InvalidationResult> {
        self.clean(CleanMode::FlushAll).await
    }

    /// Shorthand for invalidating a single tag.
    pub async fn invalidate_tag(&self, tag: impl Into<Tag>) -> Result<InvalidationResult> {
        let tag: Tag = tag.into();
        self.clean(CleanMode::matching_tag([tag])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tagcache_core::TagSet;
    use tagcache_store::MemoryStore;

    async fn connected() -> TagCache {
        TagCache::builder()
            .connect(Arc::new(MemoryStore::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_flush_all_reports_new_epoch() {
        let cache = connected().await;
        let before = cache
            .composite_key("k", &TagSet::new())
            .await
            .unwrap()
            .and_then(|k| k.epoch())
            .unwrap();

        let result = cache.flush_all().await.unwrap();

        assert!(result.applied);
        assert_eq!(result.mode, "flush_all");
        assert_eq!(result.epoch, Some(Epoch::new(before.value() + 1)));
        assert_eq!(cache.metrics().invalidations(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_tags_reports_versions() {
        let cache = connected().await;
        let tags = TagSet::from_iter(["a", "b"]);
        cache.save("v", "k", &tags, None).await.unwrap();

        let result = cache
            .clean(CleanMode::InvalidateTags(tags.clone()))
            .await
            .unwrap();

        assert_eq!(result.mode, "invalidate_tags");
        assert_eq!(
            result.tags,
            vec![
                BumpedTag {
                    tag: Tag::new("a"),
                    version: 2
                },
                BumpedTag {
                    tag: Tag::new("b"),
                    version: 2
                },
            ]
        );
        assert!(cache.load::<String>("k", &tags).await.is_none());
    }

    #[tokio::test]
    async fn test_matching_any_tag_bumps_every_tag() {
        let cache = connected().await;
        let only_a = TagSet::from_iter(["a"]);
        let only_b = TagSet::from_iter(["b"]);
        cache.save("va", "ka", &only_a, None).await.unwrap();
        cache.save("vb", "kb", &only_b, None).await.unwrap();

        cache
            .clean(CleanMode::matching_any_tag(["a", "b"]))
            .await
            .unwrap();

        assert!(cache.load::<String>("ka", &only_a).await.is_none());
        assert!(cache.load::<String>("kb", &only_b).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_tag_set_is_not_applied() {
        let cache = connected().await;

        let result = cache
            .clean(CleanMode::InvalidateTags(TagSet::new()))
            .await
            .unwrap();

        assert!(!result.applied);
        assert_eq!(cache.metrics().invalidations(), 0);
    }

    #[tokio::test]
    async fn test_untagged_entry_survives_tag_invalidation() {
        let cache = connected().await;
        cache.save("v", "plain", &TagSet::new(), None).await.unwrap();

        cache.invalidate_tag("user:1").await.unwrap();

        assert_eq!(
            cache.load::<String>("plain", &TagSet::new()).await.as_deref(),
            Some("v")
        );
    }

    #[tokio::test]
    async fn test_disabled_clean_is_noop() {
        let cache = TagCache::disabled();

        let result = cache.flush_all().await.unwrap();
        assert!(!result.applied);
        assert!(result.epoch.is_none());
    }

    #[test]
    fn test_result_serialization_skips_empty_fields() {
        let result = InvalidationResult {
            mode: "flush_all",
            applied: true,
            epoch: Some(Epoch::new(8)),
            tags: Vec::new(),
        };
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["epoch"], 8);
        assert!(json.get("tags").is_none());
    }
}
