//! Garbage collection endpoint.

use axum::{Json, extract::State};
use serde::Serialize;
use tagcache::GcOutcome;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Outcome of the requested run plus lifetime counters.
#[derive(Debug, Serialize)]
pub struct GcResponse {
    #[serde(flatten)]
    pub outcome: GcOutcome,
    pub total_sweeps: u64,
    pub total_evicted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// POST /gc
///
/// Runs one collection. A run inside the refresh window of an earlier
/// one, from any instance, reports `"status": "skipped"`.
#[instrument(skip_all)]
pub async fn run_gc(State(state): State<AppState>) -> Result<Json<GcResponse>, AppError> {
    let cache = state.cache();
    let outcome = cache.collect_garbage().await?;

    tracing::info!(
        skipped = outcome.is_skipped(),
        evicted = outcome.evicted().len(),
        "Garbage collection requested"
    );

    let stats = cache.gc_stats();
    Ok(Json(GcResponse {
        outcome,
        total_sweeps: stats.sweeps(),
        total_evicted: stats.evicted(),
        last_error: stats.last_error(),
    }))
}
