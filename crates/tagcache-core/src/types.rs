//! Common type definitions and newtypes for tagcache.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::keyspace::KEY_MARKER;

/// A label attached to cache entries for group invalidation.
///
/// Tags are compared and ordered by name, so a collection of tags always
/// iterates in the same lexicographic order regardless of insertion order.
///
/// # Example
///
/// ```
/// use tagcache_core::Tag;
///
/// let tag = Tag::new("user:42");
/// assert_eq!(tag.as_str(), "user:42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// Creates a new tag with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the tag name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An ordered, de-duplicated set of tags.
///
/// Permuting or repeating the tags a set is built from never changes the
/// set, which is what makes key derivation independent of tag order.
///
/// # Example
///
/// ```
/// use tagcache_core::TagSet;
///
/// let a = TagSet::from_iter(["posts", "user:42"]);
/// let b = TagSet::from_iter(["user:42", "posts", "posts"]);
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<Tag>);

impl TagSet {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Adds a tag. Returns false if it was already present.
    pub fn insert(&mut self, tag: impl Into<Tag>) -> bool {
        self.0.insert(tag.into())
    }

    /// Returns true if the tag is part of the set.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t.as_str() == tag)
    }

    /// Iterates tags in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    /// Returns the number of distinct tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set holds no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a comma separated list, ignoring blank items.
    ///
    /// ```
    /// use tagcache_core::TagSet;
    ///
    /// let tags = TagSet::parse_list("user:42, posts,,");
    /// assert_eq!(tags.len(), 2);
    /// assert!(tags.contains("posts"));
    /// ```
    pub fn parse_list(list: &str) -> Self {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl<T: Into<Tag>> FromIterator<T> for TagSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::collections::btree_set::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Tag::as_str).collect();
        write!(f, "[{}]", names.join(","))
    }
}

/// Global namespace epoch.
///
/// Every composite key embeds the epoch it was derived under, so advancing
/// the epoch makes all previously derived keys unreachable at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(u64);

impl Epoch {
    /// Wraps a raw epoch value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw epoch value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Epoch {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// The storage key a payload actually lives under.
///
/// Shaped `NAMESPACE:<epoch>:<digest>`, where the digest is the
/// URL-safe base64 encoding of a SHA-256 hash of the entry descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey(String);

impl CompositeKey {
    /// Assembles a key from an epoch and an already encoded digest.
    ///
    /// ```
    /// use tagcache_core::{CompositeKey, Epoch};
    ///
    /// let key = CompositeKey::from_parts(Epoch::new(7), "abc");
    /// assert_eq!(key.as_str(), "NAMESPACE:7:abc");
    /// assert_eq!(key.epoch(), Some(Epoch::new(7)));
    /// ```
    pub fn from_parts(epoch: Epoch, digest: &str) -> Self {
        Self(format!("{}:{}:{}", KEY_MARKER, epoch, digest))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the epoch segment, if the key is well formed.
    pub fn epoch(&self) -> Option<Epoch> {
        let mut parts = self.0.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(KEY_MARKER), Some(epoch), Some(_)) => epoch.parse().ok().map(Epoch),
            _ => None,
        }
    }

    /// Returns the digest segment, if the key is well formed.
    pub fn digest(&self) -> Option<&str> {
        let mut parts = self.0.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(KEY_MARKER), Some(_), Some(digest)) => Some(digest),
            _ => None,
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CompositeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What a `clean` call invalidates.
///
/// Legacy callers distinguished "matching tag" from "matching any tag", but
/// both always bumped every listed tag. The two constructors are kept for
/// those callers and produce the same variant: whether an entry
/// should be invalidated when ANY or only when ALL of the listed tags match
/// is still undecided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanMode {
    /// Advance the namespace epoch, orphaning every entry.
    FlushAll,
    /// Advance the version of every listed tag.
    InvalidateTags(TagSet),
}

impl CleanMode {
    /// Legacy `MATCHING_TAG` mode.
    pub fn matching_tag<T: Into<Tag>>(tags: impl IntoIterator<Item = T>) -> Self {
        Self::InvalidateTags(tags.into_iter().collect())
    }

    /// Legacy `MATCHING_ANY_TAG` mode. Same effect as [`CleanMode::matching_tag`].
    pub fn matching_any_tag<T: Into<Tag>>(tags: impl IntoIterator<Item = T>) -> Self {
        Self::InvalidateTags(tags.into_iter().collect())
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FlushAll => "flush_all",
            Self::InvalidateTags(_) => "invalidate_tags",
        }
    }
}
