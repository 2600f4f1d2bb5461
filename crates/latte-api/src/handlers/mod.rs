//! HTTP request handlers.

pub mod health;
pub mod lattes;
pub mod metrics;
pub mod projects;

use crate::errors::ApiError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;

pub use health::{health_check, root_status};
pub use lattes::{
    create_latte, delete_latte, get_latte, list_latte_details, list_lattes, update_latte,
};
pub use metrics::metrics_handler;
pub use projects::{create_project, delete_project, get_project, list_projects, update_project};

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("route".to_string())
}

/// A non-integer id can never name a row, so it is reported as 404.
pub(crate) fn path_id(id: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|e| ApiError::NotFound(format!("invalid id: {e}")))
}

/// Malformed, mistyped or missing JSON bodies are all 400.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}
