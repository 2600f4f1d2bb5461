//! Liveness handlers.

use crate::models::StatusResponse;
use axum::Json;

/// Handler for GET /
///
/// Reports that the server is running.
pub async fn root_status() -> Json<StatusResponse> {
    Json(StatusResponse { status: "running" })
}

/// Handler for GET /health
///
/// Liveness probe for orchestrators. Does not touch the database.
pub async fn health_check() -> &'static str {
    "OK"
}
