//! Latte catalogue store.
//!
//! Handlers talk to a [`LatteStore`]; production wires [`PgLatteStore`],
//! tests use [`mock::InMemoryLatteStore`].

use crate::errors::ApiError;
use crate::models::{Latte, LatteChanges, NewLatte};
use crate::repositories::LattesRepository;
use sqlx::PgPool;

/// Trait for latte storage operations (enables mocking).
#[async_trait::async_trait]
pub trait LatteStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Latte>, ApiError>;

    /// Fails with `NotFound` for an unknown id.
    async fn get(&self, id: i32) -> Result<Latte, ApiError>;

    /// Fails with `Conflict` for a duplicate title.
    async fn create(&self, latte: NewLatte) -> Result<Latte, ApiError>;

    async fn update(&self, id: i32, changes: LatteChanges) -> Result<Latte, ApiError>;

    async fn delete(&self, id: i32) -> Result<(), ApiError>;
}

/// PostgreSQL-backed latte store.
#[derive(Clone)]
pub struct PgLatteStore {
    pool: PgPool,
}

impl PgLatteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn latte_not_found(id: i32) -> ApiError {
    ApiError::NotFound(format!("latte {id}"))
}

#[async_trait::async_trait]
impl LatteStore for PgLatteStore {
    async fn list(&self) -> Result<Vec<Latte>, ApiError> {
        LattesRepository::list(&self.pool).await
    }

    async fn get(&self, id: i32) -> Result<Latte, ApiError> {
        LattesRepository::get(&self.pool, id)
            .await?
            .ok_or_else(|| latte_not_found(id))
    }

    async fn create(&self, latte: NewLatte) -> Result<Latte, ApiError> {
        LattesRepository::insert(&self.pool, &latte).await
    }

    async fn update(&self, id: i32, changes: LatteChanges) -> Result<Latte, ApiError> {
        LattesRepository::update(&self.pool, id, &changes)
            .await?
            .ok_or_else(|| latte_not_found(id))
    }

    async fn delete(&self, id: i32) -> Result<(), ApiError> {
        if LattesRepository::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(latte_not_found(id))
        }
    }
}

/// In-memory latte store for tests.
///
/// Enforces the same unique-title rule as the database.
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct State {
        lattes: BTreeMap<i32, Latte>,
        next_id: i32,
    }

    /// Mock latte store.
    #[derive(Default)]
    pub struct InMemoryLatteStore {
        state: Mutex<State>,
        unavailable: bool,
    }

    impl InMemoryLatteStore {
        /// Create an empty store.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a store whose every call fails as an unreachable database.
        pub fn unavailable() -> Self {
            Self {
                state: Mutex::new(State::default()),
                unavailable: true,
            }
        }

        /// Create a store pre-populated with `lattes` (ids assigned from 1).
        pub async fn with_lattes(lattes: Vec<NewLatte>) -> Result<Self, ApiError> {
            let store = Self::new();
            for latte in lattes {
                store.create(latte).await?;
            }
            Ok(store)
        }

        pub async fn len(&self) -> usize {
            self.state.lock().await.lattes.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.state.lock().await.lattes.is_empty()
        }

        fn check_available(&self) -> Result<(), ApiError> {
            if self.unavailable {
                return Err(ApiError::BadGateway(
                    "in-memory store marked unavailable".to_string(),
                ));
            }
            Ok(())
        }
    }

    fn title_taken(state: &State, title: &str, except: Option<i32>) -> bool {
        state
            .lattes
            .values()
            .any(|l| l.title == title && Some(l.id) != except)
    }

    #[async_trait::async_trait]
    impl LatteStore for InMemoryLatteStore {
        async fn list(&self) -> Result<Vec<Latte>, ApiError> {
            self.check_available()?;
            Ok(self.state.lock().await.lattes.values().cloned().collect())
        }

        async fn get(&self, id: i32) -> Result<Latte, ApiError> {
            self.check_available()?;
            self.state
                .lock()
                .await
                .lattes
                .get(&id)
                .cloned()
                .ok_or_else(|| latte_not_found(id))
        }

        async fn create(&self, latte: NewLatte) -> Result<Latte, ApiError> {
            self.check_available()?;
            let mut state = self.state.lock().await;
            if title_taken(&state, &latte.title, None) {
                return Err(ApiError::Conflict(format!(
                    "latte title '{}' already exists",
                    latte.title
                )));
            }
            state.next_id += 1;
            let created = Latte {
                id: state.next_id,
                title: latte.title,
                ingredients: latte.ingredients,
            };
            state.lattes.insert(created.id, created.clone());
            Ok(created)
        }

        async fn update(&self, id: i32, changes: LatteChanges) -> Result<Latte, ApiError> {
            self.check_available()?;
            let mut state = self.state.lock().await;
            if !state.lattes.contains_key(&id) {
                return Err(latte_not_found(id));
            }
            if let Some(title) = &changes.title {
                if title_taken(&state, title, Some(id)) {
                    return Err(ApiError::Conflict(format!(
                        "latte title '{title}' already exists"
                    )));
                }
            }
            let latte = state
                .lattes
                .get_mut(&id)
                .ok_or_else(|| latte_not_found(id))?;
            if let Some(title) = changes.title {
                latte.title = title;
            }
            if let Some(ingredients) = changes.ingredients {
                latte.ingredients = ingredients;
            }
            Ok(latte.clone())
        }

        async fn delete(&self, id: i32) -> Result<(), ApiError> {
            self.check_available()?;
            self.state
                .lock()
                .await
                .lattes
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| latte_not_found(id))
        }
    }

    #[cfg(test)]
    #[allow(clippy::unwrap_used, clippy::expect_used)]
    mod tests {
        use super::*;
        use crate::models::Ingredient;

        fn new_latte(title: &str) -> NewLatte {
            NewLatte {
                title: title.to_string(),
                ingredients: vec![Ingredient {
                    color: "white".to_string(),
                    name: "milk".to_string(),
                    parts: 2.into(),
                }],
            }
        }

        #[tokio::test]
        async fn test_create_assigns_sequential_ids() {
            let store = InMemoryLatteStore::new();

            let first = store.create(new_latte("flat white")).await.unwrap();
            let second = store.create(new_latte("cortado")).await.unwrap();

            assert_eq!(first.id, 1);
            assert_eq!(second.id, 2);
            assert_eq!(store.len().await, 2);
        }

        #[tokio::test]
        async fn test_duplicate_title_conflicts() {
            let store = InMemoryLatteStore::new();
            store.create(new_latte("mocha")).await.unwrap();

            let err = store.create(new_latte("mocha")).await.unwrap_err();
            assert!(matches!(err, ApiError::Conflict(_)));
        }

        #[tokio::test]
        async fn test_update_to_existing_title_conflicts() {
            let store = InMemoryLatteStore::new();
            store.create(new_latte("mocha")).await.unwrap();
            let cortado = store.create(new_latte("cortado")).await.unwrap();

            let changes = LatteChanges {
                title: Some("mocha".to_string()),
                ingredients: None,
            };
            let err = store.update(cortado.id, changes).await.unwrap_err();
            assert!(matches!(err, ApiError::Conflict(_)));
        }

        #[tokio::test]
        async fn test_update_missing_id_with_taken_title_is_not_found() {
            let store = InMemoryLatteStore::new();
            store.create(new_latte("mocha")).await.unwrap();

            let changes = LatteChanges {
                title: Some("mocha".to_string()),
                ingredients: None,
            };
            let err = store.update(99, changes).await.unwrap_err();
            assert!(matches!(err, ApiError::NotFound(_)), "got {err:?}");
        }

        #[tokio::test]
        async fn test_update_keeps_own_title() {
            let store = InMemoryLatteStore::new();
            let mocha = store.create(new_latte("mocha")).await.unwrap();

            let changes = LatteChanges {
                title: Some("mocha".to_string()),
                ingredients: Some(vec![]),
            };
            let updated = store.update(mocha.id, changes).await.unwrap();
            assert!(updated.ingredients.is_empty());
        }

        #[tokio::test]
        async fn test_missing_id_is_not_found() {
            let store = InMemoryLatteStore::new();

            assert!(matches!(store.get(5).await, Err(ApiError::NotFound(_))));
            assert!(matches!(store.delete(5).await, Err(ApiError::NotFound(_))));
        }

        #[tokio::test]
        async fn test_unavailable_store() {
            let store = InMemoryLatteStore::unavailable();

            assert!(matches!(store.list().await, Err(ApiError::BadGateway(_))));
        }
    }
}
