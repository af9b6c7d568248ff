use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use massreadings_core::mass::MassReading;

use crate::{handlers::AppError, state::AppState};

/// Handler for GET /mass/{date}
///
/// Serves the readings of a `YYYY-MM-DD` date through the readings cache. The
/// cached record is serialized in place, not copied.
#[axum::debug_handler]
pub async fn get_mass(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Arc<MassReading>>, AppError> {
    let reading = state.readings.lookup(&date).await?;
    Ok(Json(reading))
}
