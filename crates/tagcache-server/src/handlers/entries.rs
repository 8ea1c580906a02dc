//! Entry read and write handlers.

use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use tagcache::TagSet;
use tagcache::keyspace::MAX_TTL_SECS;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Query string shared by the entry endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct EntryQuery {
    /// Comma-separated tag names.
    pub tags: Option<String>,
    /// TTL in seconds, writes only.
    pub ttl: Option<u64>,
}

impl EntryQuery {
    /// Tags named in the query; blanks and duplicates are dropped.
    pub fn tag_set(&self) -> TagSet {
        self.tags
            .as_deref()
            .map(parse_tags)
            .unwrap_or_default()
    }

    fn ttl(&self) -> Result<Option<Duration>, AppError> {
        match self.ttl {
            Some(0) => Err(AppError::BadRequest("ttl must be positive".to_string())),
            Some(secs) if secs > MAX_TTL_SECS => Err(AppError::BadRequest(format!(
                "ttl must not exceed {} seconds",
                MAX_TTL_SECS
            ))),
            Some(secs) => Ok(Some(Duration::from_secs(secs))),
            None => Ok(None),
        }
    }
}

fn parse_tags(raw: &str) -> TagSet {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// GET /entries/{key}?tags=a,b
#[instrument(skip_all, fields(key = %key))]
pub async fn get_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<Value>, AppError> {
    let tags = query.tag_set();

    match state.cache().load::<Value>(&key, &tags).await {
        Some(value) => Ok(Json(value)),
        None => Err(AppError::NotFound { key }),
    }
}

/// PUT /entries/{key}?tags=a,b&ttl=60
///
/// 204 once stored, 503 when the cache is disabled.
#[instrument(skip_all, fields(key = %key))]
pub async fn put_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<EntryQuery>,
    Json(value): Json<Value>,
) -> Result<StatusCode, AppError> {
    let tags = query.tag_set();
    let ttl = query.ttl()?;

    if state.cache().save(&value, &key, &tags, ttl).await? {
        tracing::debug!(tags = tags.len(), "Entry stored");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::disabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        let tags = parse_tags(" user:42 ,, profiles,user:42 ");
        let names: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, ["profiles", "user:42"]);
    }

    #[test]
    fn test_missing_tags_are_empty() {
        assert!(EntryQuery::default().tag_set().is_empty());
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let query = EntryQuery {
            tags: None,
            ttl: Some(0),
        };
        assert!(matches!(query.ttl(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_ttl_upper_bound() {
        let at_limit = EntryQuery {
            tags: None,
            ttl: Some(MAX_TTL_SECS),
        };
        assert!(matches!(at_limit.ttl(), Ok(Some(_))));

        let too_long = EntryQuery {
            tags: None,
            ttl: Some(u64::MAX),
        };
        assert!(matches!(too_long.ttl(), Err(AppError::BadRequest(_))));
    }
}
