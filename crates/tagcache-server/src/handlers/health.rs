use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    /// The cache is connected to its store.
    pub fn up() -> Self {
        Self {
            status: "UP".to_string(),
        }
    }

    /// The cache runs as a no-op.
    pub fn disabled() -> Self {
        Self {
            status: "DISABLED".to_string(),
        }
    }
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self::up()
    }
}

/// GET /health
///
/// Always 200: a disabled cache still serves requests, as misses.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    if state.cache().is_connected() {
        Json(HealthResponse::up())
    } else {
        Json(HealthResponse::disabled())
    }
}
