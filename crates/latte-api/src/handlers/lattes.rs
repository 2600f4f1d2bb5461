//! Latte catalogue handlers.
//!
//! Reads are public. Writes run behind `require_permission`, which places
//! the verified [`ClaimSet`] in the request extensions.

use crate::auth::ClaimSet;
use crate::errors::ApiError;
use crate::handlers::{json_body, path_id};
use crate::models::{
    CreateLatteRequest, DeleteLatteResponse, Latte, LattesResponse, UpdateLatteRequest,
};
use crate::routes::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /api/latte
#[instrument(skip_all, name = "latte.handlers.list_lattes")]
pub async fn list_lattes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LattesResponse<Vec<Latte>>>, ApiError> {
    let lattes = state.lattes.list().await?;
    Ok(Json(LattesResponse::new(lattes)))
}

/// Handler for GET /api/latte/{id}
#[instrument(skip_all, name = "latte.handlers.get_latte")]
pub async fn get_latte(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<LattesResponse<Latte>>, ApiError> {
    let latte = state.lattes.get(path_id(id)?).await?;
    Ok(Json(LattesResponse::new(latte)))
}

/// Handler for GET /api/latte-detail
///
/// Same listing as the public endpoint, behind the `get:latte` permission.
#[instrument(skip_all, name = "latte.handlers.list_latte_details")]
pub async fn list_latte_details(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ClaimSet>,
) -> Result<Json<LattesResponse<Vec<Latte>>>, ApiError> {
    let lattes = state.lattes.list().await?;
    tracing::debug!(
        target: "latte.handlers.lattes",
        issuer = %claims.iss,
        count = lattes.len(),
        "Latte details listed"
    );
    Ok(Json(LattesResponse::new(lattes)))
}

/// Handler for POST /api/latte
///
/// Returns 201 with the created latte as a one-element list.
#[instrument(skip_all, name = "latte.handlers.create_latte")]
pub async fn create_latte(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ClaimSet>,
    body: Result<Json<CreateLatteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LattesResponse<Vec<Latte>>>), ApiError> {
    let new_latte = json_body(body)?.validate()?;
    let latte = state.lattes.create(new_latte).await?;

    tracing::info!(
        target: "latte.handlers.lattes",
        latte_id = latte.id,
        issuer = %claims.iss,
        "Latte created"
    );

    Ok((StatusCode::CREATED, Json(LattesResponse::new(vec![latte]))))
}

/// Handler for PATCH /api/latte/{id}
///
/// Updates the title, the ingredients, or both.
#[instrument(skip_all, name = "latte.handlers.update_latte")]
pub async fn update_latte(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ClaimSet>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<UpdateLatteRequest>, JsonRejection>,
) -> Result<Json<LattesResponse<Vec<Latte>>>, ApiError> {
    let id = path_id(id)?;
    let changes = json_body(body)?.validate()?;
    let latte = state.lattes.update(id, changes).await?;

    tracing::info!(
        target: "latte.handlers.lattes",
        latte_id = latte.id,
        issuer = %claims.iss,
        "Latte updated"
    );

    Ok(Json(LattesResponse::new(vec![latte])))
}

/// Handler for DELETE /api/latte/{id}
#[instrument(skip_all, name = "latte.handlers.delete_latte")]
pub async fn delete_latte(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ClaimSet>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<DeleteLatteResponse>, ApiError> {
    let id = path_id(id)?;
    state.lattes.delete(id).await?;

    tracing::info!(
        target: "latte.handlers.lattes",
        latte_id = id,
        issuer = %claims.iss,
        "Latte deleted"
    );

    Ok(Json(DeleteLatteResponse {
        success: true,
        delete: id,
    }))
}
