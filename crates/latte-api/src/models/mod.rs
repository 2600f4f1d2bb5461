//! Data models for the latte catalogue and project portfolio.

pub mod latte;
pub mod project;

use serde::Serialize;

pub use latte::{
    CreateLatteRequest, DeleteLatteResponse, Ingredient, Latte, LatteChanges, LatteRow,
    LattesResponse, NewLatte, UpdateLatteRequest,
};
pub use project::{DeleteProjectResponse, NewProject, Project, ProjectRequest, ProjectRow};

/// Response for `GET /`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}
