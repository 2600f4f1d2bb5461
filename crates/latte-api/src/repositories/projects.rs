//! Projects repository for database operations.

use crate::errors::ApiError;
use crate::models::{NewProject, Project, ProjectRow};
use crate::observability::metrics;
use sqlx::{PgPool, Row};
use std::time::Instant;
use tracing::instrument;

const PROJECT_COLUMNS: &str = "id, title, meta, description, image, git_repo, demo_link";

/// Projects repository for database operations.
pub struct ProjectsRepository;

impl ProjectsRepository {
    #[instrument(skip_all, name = "latte.repo.list_projects")]
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, ApiError> {
        let start = Instant::now();

        let rows = sqlx::query(&format!("SELECT {PROJECT_COLUMNS} FROM project ORDER BY id"))
            .fetch_all(pool)
            .await
            .map_err(|e| observe_error("list_projects", start, e))?;

        metrics::record_db_query("list_projects", "success", start.elapsed());

        rows.into_iter()
            .map(|row| map_row(&row).and_then(Project::try_from))
            .collect()
    }

    #[instrument(skip_all, name = "latte.repo.get_project", fields(project_id = id))]
    pub async fn get(pool: &PgPool, id: i32) -> Result<Option<Project>, ApiError> {
        let start = Instant::now();

        let row = sqlx::query(&format!("SELECT {PROJECT_COLUMNS} FROM project WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| observe_error("get_project", start, e))?;

        metrics::record_db_query("get_project", "success", start.elapsed());

        row.map(|row| map_row(&row).and_then(Project::try_from))
            .transpose()
    }

    #[instrument(skip_all, name = "latte.repo.insert_project")]
    pub async fn insert(pool: &PgPool, project: &NewProject) -> Result<Project, ApiError> {
        let start = Instant::now();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO project (title, meta, description, image, git_repo, demo_link)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(&project.title)
        .bind(&project.meta)
        .bind(&project.description)
        .bind(&project.image)
        .bind(&project.git_repo)
        .bind(&project.demo_link)
        .fetch_one(pool)
        .await
        .map_err(|e| observe_error("insert_project", start, e))?;

        metrics::record_db_query("insert_project", "success", start.elapsed());

        Project::try_from(map_row(&row)?)
    }

    /// Replace every field of a project.
    ///
    /// Returns `None` if no project has this id.
    #[instrument(skip_all, name = "latte.repo.replace_project", fields(project_id = id))]
    pub async fn replace(
        pool: &PgPool,
        id: i32,
        project: &NewProject,
    ) -> Result<Option<Project>, ApiError> {
        let start = Instant::now();

        let row = sqlx::query(&format!(
            r#"
            UPDATE project
            SET title = $2, meta = $3, description = $4,
                image = $5, git_repo = $6, demo_link = $7
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&project.title)
        .bind(&project.meta)
        .bind(&project.description)
        .bind(&project.image)
        .bind(&project.git_repo)
        .bind(&project.demo_link)
        .fetch_optional(pool)
        .await
        .map_err(|e| observe_error("replace_project", start, e))?;

        metrics::record_db_query("replace_project", "success", start.elapsed());

        row.map(|row| map_row(&row).and_then(Project::try_from))
            .transpose()
    }

    /// Delete a project. Returns `false` if no project has this id.
    #[instrument(skip_all, name = "latte.repo.delete_project", fields(project_id = id))]
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, ApiError> {
        let start = Instant::now();

        let result = sqlx::query("DELETE FROM project WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| observe_error("delete_project", start, e))?;

        metrics::record_db_query("delete_project", "success", start.elapsed());

        Ok(result.rows_affected() > 0)
    }
}

fn observe_error(operation: &str, start: Instant, err: sqlx::Error) -> ApiError {
    metrics::record_db_query(operation, "error", start.elapsed());
    tracing::debug!(target: "latte.repo.projects", operation, error = %err, "Query failed");
    ApiError::from(err)
}

fn map_row(row: &sqlx::postgres::PgRow) -> Result<ProjectRow, ApiError> {
    Ok(ProjectRow {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        meta: row.try_get("meta")?,
        description: row.try_get("description")?,
        image: row.try_get("image")?,
        git_repo: row.try_get("git_repo")?,
        demo_link: row.try_get("demo_link")?,
    })
}
