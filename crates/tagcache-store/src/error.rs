//! Error types for backing stores.

use tagcache_core::TagCacheError;

/// Errors that can occur when talking to a backing key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store is not reachable.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// A timeout occurred while waiting for the store.
    #[error("operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The key holds a value of another shape (string vs hash).
    #[error("wrong type for key '{key}': expected {expected}")]
    WrongType { key: String, expected: &'static str },

    /// An increment targeted a value that is not an integer.
    #[error("value under '{key}' is not an integer")]
    NotAnInteger { key: String },

    /// An expiry too far in the future for the store to represent.
    #[error("ttl of {seconds}s is out of range")]
    TtlOutOfRange { seconds: u64 },

    /// The store rejected or failed the command.
    #[error("backend error: {0}")]
    Backend(String),

    /// Invalid store configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Creates a new store unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a new backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Creates a new wrong type error.
    pub fn wrong_type(key: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongType {
            key: key.into(),
            expected,
        }
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }

    /// Converts into a cache error tagged with the failing operation.
    pub fn during(self, operation: &str) -> TagCacheError {
        let transient = self.is_transient();
        TagCacheError::store_with_cause(operation, transient, self)
    }
}

impl From<StoreError> for TagCacheError {
    fn from(err: StoreError) -> Self {
        err.during("store")
    }
}
