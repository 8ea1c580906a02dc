//! Persisted keyspace shared by every tagcache instance.
//!
//! These names must not change: independently deployed instances pointed
//! at the same backing store cooperate only through them.

/// String key holding the current namespace epoch.
pub const NAMESPACE_KEY: &str = "NAMESPACE";

/// Hash key mapping tag name to its version counter.
pub const TAGS_KEY: &str = "TAGS";

/// Hash key mapping tag name to its last-touched unix timestamp.
pub const TIME_KEY: &str = "TIME";

/// String key used as the garbage collection single-flight marker.
pub const REFRESH_KEY: &str = "REFRESH";

/// Leading segment of every composite payload key.
pub const KEY_MARKER: &str = "NAMESPACE";

/// Default payload time-to-live in seconds.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Default garbage collection window in seconds (also the marker TTL).
pub const DEFAULT_REFRESH_WINDOW_SECS: u64 = 7200;

/// Default idle time after which tag metadata is forgotten, in seconds.
pub const DEFAULT_STALE_AFTER_SECS: u64 = 86_400;

/// Version assigned to a tag the first time it is seen.
pub const INITIAL_TAG_VERSION: u64 = 1;

/// Longest payload time-to-live accepted, in seconds (one year).
pub const MAX_TTL_SECS: u64 = 365 * 86_400;
