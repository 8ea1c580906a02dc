//! Error types for tagcache.
//!
//! This module defines the error hierarchy used throughout the
//! tagcache workspace. All errors implement the standard
//! `std::error::Error` trait via `thiserror`.
//!
//! # Error Handling Philosophy
//!
//! - Functions that can fail return `Result<T, TagCacheError>`
//! - Cache misses and a disabled cache are not errors
//! - Decode failures exist so the load path can turn them into misses
//!
//! # Example
//!
//! ```
//! use tagcache_core::{Result, TagCacheError};
//!
//! fn parse_ttl(raw: &str) -> Result<u64> {
//!     raw.parse()
//!         .map_err(|_| TagCacheError::invalid_config("ttl", "must be an integer"))
//! }
//!
//! assert!(parse_ttl("60").is_ok());
//! assert!(parse_ttl("soon").is_err());
//! ```

use thiserror::Error;

/// Main error type for tagcache operations.
///
/// # Example
///
/// ```
/// use tagcache_core::TagCacheError;
///
/// let error = TagCacheError::decode("invalid zlib header");
/// assert!(error.is_decode_failure());
/// ```
#[derive(Debug, Error)]
pub enum TagCacheError {
    /// The backing store could not be reached. Permanent for a facade.
    #[error("Connection to '{endpoint}' failed: {message}")]
    ConnectionFailure {
        /// Store name or address that was contacted
        endpoint: String,
        /// Description of the failure
        message: String,
    },

    /// A backing store call failed.
    #[error("Store operation '{operation}' failed: {message}")]
    Store {
        /// Name of the store operation (get, hincr, ...)
        operation: String,
        /// Description of what went wrong
        message: String,
        /// Whether retrying could succeed
        transient: bool,
        /// Underlying error
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored payload could not be decoded.
    #[error("Failed to decode payload: {message}")]
    Decode {
        /// Description of the decode failure
        message: String,
    },

    /// A value could not be encoded for storage.
    #[error("Failed to encode value: {message}")]
    Encode {
        /// Description of the encode failure
        message: String,
    },

    /// Configuration value is invalid.
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfig {
        /// Field that failed validation
        field: String,
        /// Why it's invalid
        message: String,
    },

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TagCacheError {
    // ============================================
    // Convenience constructors
    // ============================================

    /// Creates a ConnectionFailure error.
    pub fn connection_failure(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailure {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a Store error without a cause.
    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.into(),
            message: message.into(),
            transient: false,
            cause: None,
        }
    }

    /// Creates a Store error carrying its cause.
    pub fn store_with_cause<E>(
        operation: impl Into<String>,
        transient: bool,
        cause: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store {
            operation: operation.into(),
            message: cause.to_string(),
            transient,
            cause: Some(Box::new(cause)),
        }
    }

    /// Creates a Decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an Encode error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Creates an InvalidConfig error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================
    // Query methods
    // ============================================

    /// Returns true if the store could not be reached at all.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::ConnectionFailure { .. })
    }

    /// Returns true if a stored payload was undecodable.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Returns true if this is a backing store error.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store { .. })
    }

    /// Returns true if retrying the operation might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store { transient: true, .. })
    }
}

/// Type alias for Results with TagCacheError.
pub type Result<T> = std::result::Result<T, TagCacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failure_display() {
        let error = TagCacheError::connection_failure("redis://cache:6379", "refused");
        let msg = format!("{}", error);

        assert!(msg.contains("redis://cache:6379"));
        assert!(msg.contains("refused"));
        assert!(error.is_connection_failure());
    }

    #[test]
    fn test_store_error_source_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let error = TagCacheError::store_with_cause("hincr", true, io_error);

        use std::error::Error;
        assert!(error.source().is_some());
        assert!(error.is_store_error());
        assert!(error.is_transient());
        assert!(error.to_string().contains("hincr"));
    }

    #[test]
    fn test_store_error_without_cause_is_not_transient() {
        let error = TagCacheError::store("get", "wrong type");
        assert!(!error.is_transient());
    }

    #[test]
    fn test_decode_is_not_connection_failure() {
        let decode = TagCacheError::decode("truncated");

        assert!(decode.is_decode_failure());
        assert!(!decode.is_connection_failure());
        assert!(!decode.is_transient());
    }

    #[test]
    fn test_result_with_question_mark() {
        fn inner() -> Result<()> {
            Err(TagCacheError::internal("test"))
        }

        fn outer() -> Result<String> {
            inner()?;
            Ok("success".into())
        }

        assert!(outer().is_err());
    }

    #[test]
    fn test_invalid_config() {
        let error = TagCacheError::invalid_config("gc.stale_after_secs", "must be positive");
        let msg = format!("{}", error);

        assert!(msg.contains("gc.stale_after_secs"));
        assert!(msg.contains("must be positive"));
    }
}
