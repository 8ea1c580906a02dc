//! Cache invalidation endpoint handlers.
//!
//! Invalidation never deletes payloads: it advances the namespace epoch or
//! tag versions, and the response reports the new values. A disabled cache
//! answers with `applied: false`.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tagcache::{CleanMode, InvalidationResult, TagSet};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Request body for invalidating several tags at once.
#[derive(Debug, Deserialize)]
pub struct InvalidateTagsRequest {
    pub tags: Vec<String>,
}

/// DELETE /cache
/// Orphans every entry by advancing the namespace epoch.
#[instrument(skip_all)]
pub async fn invalidate_all(
    State(state): State<AppState>,
) -> Result<Json<InvalidationResult>, AppError> {
    let result = state.cache().clean(CleanMode::FlushAll).await?;

    tracing::info!(applied = result.applied, epoch = ?result.epoch, "Cache flushed");

    Ok(Json(result))
}

/// DELETE /tags/{tag}
/// Orphans every entry saved under the tag.
#[instrument(skip_all, fields(tag = %tag))]
pub async fn invalidate_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<InvalidationResult>, AppError> {
    if tag.trim().is_empty() {
        return Err(AppError::BadRequest("tag must not be blank".to_string()));
    }

    let result = state.cache().invalidate_tag(tag.as_str()).await?;

    tracing::info!(applied = result.applied, "Tag invalidated");

    Ok(Json(result))
}

/// POST /invalidate
/// Orphans every entry saved under at least one of the listed tags.
#[instrument(skip_all, fields(count = request.tags.len()))]
pub async fn invalidate_tags(
    State(state): State<AppState>,
    Json(request): Json<InvalidateTagsRequest>,
) -> Result<Json<InvalidationResult>, AppError> {
    let tags: TagSet = request
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();

    if tags.is_empty() {
        return Err(AppError::BadRequest("tags must not be empty".to_string()));
    }

    let result = state.cache().clean(CleanMode::InvalidateTags(tags)).await?;

    tracing::info!(
        applied = result.applied,
        count = result.tags.len(),
        "Tags invalidated"
    );

    Ok(Json(result))
}
