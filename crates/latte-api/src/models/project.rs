//! Project portfolio models.

use crate::errors::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum title length (matches the `project.title` column).
pub const MAX_PROJECT_TITLE_LEN: usize = 80;

/// Maximum length of the other text columns, `meta` measured serialized.
pub const MAX_PROJECT_FIELD_LEN: usize = 300;

/// A project as returned to clients, with `meta` as parsed JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: i32,
    pub title: String,
    pub meta: Value,
    pub description: String,
    pub image: String,
    pub git_repo: String,
    pub demo_link: String,
}

#[derive(Debug, Clone)]
pub struct ProjectRow {
    pub id: i32,
    pub title: String,
    pub meta: String,
    pub description: String,
    pub image: String,
    pub git_repo: String,
    pub demo_link: String,
}

impl TryFrom<ProjectRow> for Project {
    type Error = ApiError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let meta = serde_json::from_str(&row.meta).map_err(|e| {
            ApiError::Database(format!("project {} has unreadable meta: {}", row.id, e))
        })?;
        Ok(Project {
            id: row.id,
            title: row.title,
            meta,
            description: row.description,
            image: row.image,
            git_repo: row.git_repo,
            demo_link: row.demo_link,
        })
    }
}

/// Request body for project create and full-replacement update.
///
/// Every field is required; `meta` may be any JSON value.
#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub title: String,
    pub meta: Value,
    pub description: String,
    pub image: String,
    pub git_repo: String,
    pub demo_link: String,
}

/// Validated project fields with `meta` serialized for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub meta: String,
    pub description: String,
    pub image: String,
    pub git_repo: String,
    pub demo_link: String,
}

impl ProjectRequest {
    pub fn validate(self) -> Result<NewProject, ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::BadRequest("title is empty".to_string()));
        }
        check_len("title", &self.title, MAX_PROJECT_TITLE_LEN)?;

        let meta = serde_json::to_string(&self.meta).map_err(|e| {
            tracing::error!(target: "latte.models", error = %e, "Failed to encode project meta");
            ApiError::Internal
        })?;
        check_len("meta", &meta, MAX_PROJECT_FIELD_LEN)?;
        check_len("description", &self.description, MAX_PROJECT_FIELD_LEN)?;
        check_len("image", &self.image, MAX_PROJECT_FIELD_LEN)?;
        check_len("git_repo", &self.git_repo, MAX_PROJECT_FIELD_LEN)?;
        check_len("demo_link", &self.demo_link, MAX_PROJECT_FIELD_LEN)?;

        Ok(NewProject {
            title: self.title,
            meta,
            description: self.description,
            image: self.image,
            git_repo: self.git_repo,
            demo_link: self.demo_link,
        })
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::BadRequest(format!(
            "{field} exceeds {max} characters"
        )));
    }
    Ok(())
}

/// Response for `DELETE /api/project/{id}`.
#[derive(Debug, Serialize)]
pub struct DeleteProjectResponse {
    pub success: bool,
    pub project_id: i32,
}
