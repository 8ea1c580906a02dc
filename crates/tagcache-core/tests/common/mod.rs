#![allow(dead_code)]
use tagcache_core::TagSet;

/// Tags used by the profile scenarios.
pub fn profile_tags() -> TagSet {
    TagSet::from_iter(["user:42", "profiles"])
}

/// Every permutation of three tag names.
pub fn permutations() -> Vec<[&'static str; 3]> {
    vec![
        ["a", "b", "c"],
        ["a", "c", "b"],
        ["b", "a", "c"],
        ["b", "c", "a"],
        ["c", "a", "b"],
        ["c", "b", "a"],
    ]
}
