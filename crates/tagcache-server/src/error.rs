//! HTTP error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tagcache::TagCacheError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// No live entry under the key and tags.
    #[error("no cached entry for key '{key}'")]
    NotFound { key: String },

    /// Invalid parameters.
    #[error("{0}")]
    BadRequest(String),

    /// The cache is disabled or the store is temporarily unreachable.
    #[error("{0}")]
    Unavailable(String),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn disabled() -> Self {
        Self::Unavailable("Cache is disabled".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TagCacheError> for AppError {
    fn from(err: TagCacheError) -> Self {
        match &err {
            TagCacheError::InvalidConfig { .. } | TagCacheError::Encode { .. } => {
                AppError::BadRequest(err.to_string())
            },
            _ if err.is_store_error() || err.is_connection_failure() => {
                AppError::Unavailable(err.to_string())
            },
            _ => AppError::Internal(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = Json(ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::NotFound { key: "k".into() }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::disabled().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_from_cache_error() {
        let err = AppError::from(TagCacheError::invalid_config("ttl", "must be positive"));
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = AppError::from(TagCacheError::store("incr", "connection reset"));
        assert!(matches!(err, AppError::Unavailable(_)));

        let err = AppError::from(TagCacheError::internal("boom"));
        assert!(matches!(err, AppError::Internal(_)));
    }
}
