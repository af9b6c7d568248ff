//! Health check endpoints.
//!
//! - `/livez` - Basic liveness probe (immediate 200, no checks)
//! - `/healthz` - Readings cache statistics

use axum::{extract::State, http::StatusCode, Json};

use crate::{cache::CacheStats, state::AppState};

/// GET /livez - Basic liveness probe.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - Readings cache counters.
///
/// Reads the counters only; never touches the upstream.
#[axum::debug_handler]
pub async fn healthz(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.readings.stats())
}
