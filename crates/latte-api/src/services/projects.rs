//! Project portfolio store.

use crate::errors::ApiError;
use crate::models::{NewProject, Project};
use crate::repositories::ProjectsRepository;
use sqlx::PgPool;

/// Trait for project storage operations (enables mocking).
#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Project>, ApiError>;

    async fn get(&self, id: i32) -> Result<Project, ApiError>;

    async fn create(&self, project: NewProject) -> Result<Project, ApiError>;

    /// Full replacement of every field.
    async fn replace(&self, id: i32, project: NewProject) -> Result<Project, ApiError>;

    async fn delete(&self, id: i32) -> Result<(), ApiError>;
}

/// PostgreSQL-backed project store.
#[derive(Clone)]
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn project_not_found(id: i32) -> ApiError {
    ApiError::NotFound(format!("project {id}"))
}

#[async_trait::async_trait]
impl ProjectStore for PgProjectStore {
    async fn list(&self) -> Result<Vec<Project>, ApiError> {
        ProjectsRepository::list(&self.pool).await
    }

    async fn get(&self, id: i32) -> Result<Project, ApiError> {
        ProjectsRepository::get(&self.pool, id)
            .await?
            .ok_or_else(|| project_not_found(id))
    }

    async fn create(&self, project: NewProject) -> Result<Project, ApiError> {
        ProjectsRepository::insert(&self.pool, &project).await
    }

    async fn replace(&self, id: i32, project: NewProject) -> Result<Project, ApiError> {
        ProjectsRepository::replace(&self.pool, id, &project)
            .await?
            .ok_or_else(|| project_not_found(id))
    }

    async fn delete(&self, id: i32) -> Result<(), ApiError> {
        if ProjectsRepository::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(project_not_found(id))
        }
    }
}

/// In-memory project store for tests.
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct State {
        projects: BTreeMap<i32, Project>,
        next_id: i32,
    }

    /// Mock project store.
    #[derive(Default)]
    pub struct InMemoryProjectStore {
        state: Mutex<State>,
    }

    impl InMemoryProjectStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn len(&self) -> usize {
            self.state.lock().await.projects.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.state.lock().await.projects.is_empty()
        }
    }

    fn materialize(id: i32, project: NewProject) -> Result<Project, ApiError> {
        let meta = serde_json::from_str(&project.meta)
            .map_err(|e| ApiError::BadRequest(format!("meta is not JSON: {e}")))?;
        Ok(Project {
            id,
            title: project.title,
            meta,
            description: project.description,
            image: project.image,
            git_repo: project.git_repo,
            demo_link: project.demo_link,
        })
    }

    fn title_taken(state: &State, title: &str, except: Option<i32>) -> bool {
        state
            .projects
            .values()
            .any(|p| p.title == title && Some(p.id) != except)
    }

    #[async_trait::async_trait]
    impl ProjectStore for InMemoryProjectStore {
        async fn list(&self) -> Result<Vec<Project>, ApiError> {
            Ok(self.state.lock().await.projects.values().cloned().collect())
        }

        async fn get(&self, id: i32) -> Result<Project, ApiError> {
            self.state
                .lock()
                .await
                .projects
                .get(&id)
                .cloned()
                .ok_or_else(|| project_not_found(id))
        }

        async fn create(&self, project: NewProject) -> Result<Project, ApiError> {
            let mut state = self.state.lock().await;
            if title_taken(&state, &project.title, None) {
                return Err(ApiError::Conflict(format!(
                    "project title '{}' already exists",
                    project.title
                )));
            }
            let created = materialize(state.next_id + 1, project)?;
            state.next_id = created.id;
            state.projects.insert(created.id, created.clone());
            Ok(created)
        }

        async fn replace(&self, id: i32, project: NewProject) -> Result<Project, ApiError> {
            let mut state = self.state.lock().await;
            if !state.projects.contains_key(&id) {
                return Err(project_not_found(id));
            }
            if title_taken(&state, &project.title, Some(id)) {
                return Err(ApiError::Conflict(format!(
                    "project title '{}' already exists",
                    project.title
                )));
            }
            let replaced = materialize(id, project)?;
            state.projects.insert(id, replaced.clone());
            Ok(replaced)
        }

        async fn delete(&self, id: i32) -> Result<(), ApiError> {
            self.state
                .lock()
                .await
                .projects
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| project_not_found(id))
        }
    }

}
