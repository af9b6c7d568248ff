use axum::Json;
use serde_json::{json, Value};

/// Handler for GET /
///
/// Service banner with the list of endpoints.
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Catholic Mass Readings API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "mass_readings": "/mass/{date}",
            "liveness": "/livez",
            "health": "/healthz"
        }
    }))
}
