//! Project portfolio handlers.
//!
//! Responses carry the bare project representation rather than an envelope.

use crate::auth::ClaimSet;
use crate::errors::ApiError;
use crate::handlers::{json_body, path_id};
use crate::models::{DeleteProjectResponse, Project, ProjectRequest};
use crate::routes::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /api/project
#[instrument(skip_all, name = "latte.handlers.list_projects")]
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.projects.list().await?))
}

/// Handler for GET /api/project/{id}
#[instrument(skip_all, name = "latte.handlers.get_project")]
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.projects.get(path_id(id)?).await?))
}

/// Handler for POST /api/project
#[instrument(skip_all, name = "latte.handlers.create_project")]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ClaimSet>,
    body: Result<Json<ProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let new_project = json_body(body)?.validate()?;
    let project = state.projects.create(new_project).await?;

    tracing::info!(
        target: "latte.handlers.projects",
        project_id = project.id,
        issuer = %claims.iss,
        "Project created"
    );

    Ok((StatusCode::CREATED, Json(project)))
}

/// Handler for PATCH /api/project/{id}
///
/// Every field is required; the stored project is replaced wholesale.
#[instrument(skip_all, name = "latte.handlers.update_project")]
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ClaimSet>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<ProjectRequest>, JsonRejection>,
) -> Result<Json<Project>, ApiError> {
    let id = path_id(id)?;
    let replacement = json_body(body)?.validate()?;
    let project = state.projects.replace(id, replacement).await?;

    tracing::info!(
        target: "latte.handlers.projects",
        project_id = project.id,
        issuer = %claims.iss,
        "Project updated"
    );

    Ok(Json(project))
}

/// Handler for DELETE /api/project/{id}
#[instrument(skip_all, name = "latte.handlers.delete_project")]
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ClaimSet>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<DeleteProjectResponse>, ApiError> {
    let id = path_id(id)?;
    state.projects.delete(id).await?;

    tracing::info!(
        target: "latte.handlers.projects",
        project_id = id,
        issuer = %claims.iss,
        "Project deleted"
    );

    Ok(Json(DeleteProjectResponse {
        success: true,
        project_id: id,
    }))
}
