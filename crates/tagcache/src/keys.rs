//! Composite key derivation.
//!
//! A composite key is a pure function of the namespace epoch, the prefix,
//! the logical key and the versions of the tags the entry depends on.
//! Bumping any of those inputs yields a different key, which is the whole
//! invalidation mechanism: stale entries are never deleted, only orphaned.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use tagcache_core::{CompositeKey, Epoch, Result, Tag, TagSet};

use crate::tags::TagVersionStore;

/// Derives composite keys from live tag versions.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    tags: TagVersionStore,
}

impl KeyDeriver {
    pub fn new(tags: TagVersionStore) -> Self {
        Self { tags }
    }

    /// Derives the key for `key` under `epoch` and `prefix`.
    ///
    /// Reading each tag's version also marks the tag as in use, so garbage
    /// collection keeps tags that live entries depend on.
    ///
    /// # Errors
    ///
    /// Only backing store failures while reading tag versions.
    pub async fn derive(
        &self,
        epoch: Epoch,
        prefix: &str,
        key: &str,
        tags: &TagSet,
    ) -> Result<CompositeKey> {
        let versions = self.tags.versions(tags).await?;
        Ok(compose(epoch, prefix, key, &versions))
    }

    pub fn tag_versions(&self) -> &TagVersionStore {
        &self.tags
    }
}

/// Builds a composite key from an already read version snapshot.
///
/// Tags are sorted here as well, so callers may pass the snapshot in any
/// order.
///
/// The hashed descriptor is the JSON array
/// `[prefix, key, [tag, ...], [version, ...]]`, not the plain concatenation
/// of those fields. Keys composed here therefore never match keys written
/// by an implementation that hashes the concatenated form, and instances of
/// both kinds must not share a store expecting to read each other's
/// entries.
pub fn compose(epoch: Epoch, prefix: &str, key: &str, versions: &[(Tag, u64)]) -> CompositeKey {
    let mut sorted: Vec<&(Tag, u64)> = versions.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted.dedup_by(|a, b| a.0 == b.0);

    let names: Vec<&str> = sorted.iter().map(|(tag, _)| tag.as_str()).collect();
    let numbers: Vec<u64> = sorted.iter().map(|(_, version)| *version).collect();

    // JSON keeps field boundaries explicit: ("a:b", "c") and ("a", "b:c")
    // cannot produce the same descriptor.
    let descriptor = serde_json::json!([prefix, key, names, numbers]).to_string();
    let digest = Sha256::digest(descriptor.as_bytes());

    CompositeKey::from_parts(epoch, &URL_SAFE_NO_PAD.encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;
    use std::sync::Arc;
    use tagcache_store::MemoryStore;

    fn snapshot(pairs: &[(&str, u64)]) -> Vec<(Tag, u64)> {
        pairs.iter().map(|(t, v)| (Tag::new(*t), *v)).collect()
    }

    #[test]
    fn test_key_shape() {
        let key = compose(Epoch::new(12), "app", "profile", &snapshot(&[("user:42", 1)]));

        assert!(key.as_str().starts_with("NAMESPACE:12:"));
        assert_eq!(key.epoch(), Some(Epoch::new(12)));
        // 32 bytes of SHA-256, base64 without padding.
        let digest = key.digest().unwrap();
        assert_eq!(digest.len(), 43);
        assert!(!digest.contains('='));
        assert!(!digest.contains('+') && !digest.contains('/'));
    }

    #[test]
    fn test_deterministic() {
        let versions = snapshot(&[("a", 1), ("b", 3)]);
        assert_eq!(
            compose(Epoch::new(1), "", "k", &versions),
            compose(Epoch::new(1), "", "k", &versions)
        );
    }

    #[test]
    fn test_every_input_changes_the_key() {
        let base = compose(Epoch::new(1), "p", "k", &snapshot(&[("a", 1)]));

        assert_ne!(base, compose(Epoch::new(2), "p", "k", &snapshot(&[("a", 1)])));
        assert_ne!(base, compose(Epoch::new(1), "q", "k", &snapshot(&[("a", 1)])));
        assert_ne!(base, compose(Epoch::new(1), "p", "j", &snapshot(&[("a", 1)])));
        assert_ne!(base, compose(Epoch::new(1), "p", "k", &snapshot(&[("a", 2)])));
        assert_ne!(base, compose(Epoch::new(1), "p", "k", &snapshot(&[("b", 1)])));
        assert_ne!(base, compose(Epoch::new(1), "p", "k", &[]));
    }

    #[test]
    fn test_field_boundaries_do_not_alias() {
        let left = compose(Epoch::new(1), "a:b", "c", &[]);
        let right = compose(Epoch::new(1), "a", "b:c", &[]);
        assert_ne!(left, right);

        let left = compose(Epoch::new(1), "", "k", &snapshot(&[("a", 11)]));
        let right = compose(Epoch::new(1), "", "k", &snapshot(&[("a1", 1)]));
        assert_ne!(left, right);
    }

    #[test]
    fn test_digest_covers_json_descriptor() {
        let key = compose(Epoch::new(7), "app", "profile", &snapshot(&[("b", 2), ("a", 1)]));

        let json = Sha256::digest(br#"["app","profile",["a","b"],[1,2]]"#);
        assert_eq!(key.digest(), Some(URL_SAFE_NO_PAD.encode(json).as_str()));

        let concatenated = Sha256::digest(b"appprofileab12");
        assert_ne!(key.digest(), Some(URL_SAFE_NO_PAD.encode(concatenated).as_str()));
    }

    #[tokio::test]
    async fn test_derive_reads_and_touches_versions() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(500);
        let tags = TagVersionStore::new(Arc::new(store), Arc::new(clock));
        let deriver = KeyDeriver::new(tags.clone());

        let set = TagSet::from_iter(["posts", "user:1"]);
        let derived = deriver.derive(Epoch::new(3), "", "feed", &set).await.unwrap();

        assert_eq!(
            derived,
            compose(
                Epoch::new(3),
                "",
                "feed",
                &snapshot(&[("posts", 1), ("user:1", 1)])
            )
        );
        assert_eq!(
            tags.last_touched(&Tag::new("posts")).await.unwrap(),
            Some(500)
        );
    }

    proptest! {
        #[test]
        fn prop_order_independent(
            mut pairs in proptest::collection::btree_map("[a-z:]{1,8}", 1u64..50, 0..6)
                .prop_map(|m| m.into_iter().collect::<Vec<_>>()),
            seed in any::<u64>(),
        ) {
            let original: Vec<(Tag, u64)> =
                pairs.iter().map(|(t, v)| (Tag::new(t.clone()), *v)).collect();
            let expected = compose(Epoch::new(9), "pre", "key", &original);

            // Deterministic shuffle driven by the seed.
            let len = pairs.len().max(1);
            pairs.rotate_left((seed as usize) % len);
            pairs.reverse();
            let shuffled: Vec<(Tag, u64)> =
                pairs.iter().map(|(t, v)| (Tag::new(t.clone()), *v)).collect();

            prop_assert_eq!(compose(Epoch::new(9), "pre", "key", &shuffled), expected);
        }
    }
}
