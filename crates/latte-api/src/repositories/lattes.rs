//! Lattes repository for database operations.
//!
//! All queries use parameterized statements. Errors are classified through
//! `From<sqlx::Error> for ApiError` so unique violations surface as 409 and
//! connectivity failures as 502.

use crate::errors::ApiError;
use crate::models::latte::encode_ingredients;
use crate::models::{Latte, LatteChanges, LatteRow, NewLatte};
use crate::observability::metrics;
use sqlx::{PgPool, Row};
use std::time::Instant;
use tracing::instrument;

/// Lattes repository for database operations.
pub struct LattesRepository;

impl LattesRepository {
    /// List every latte ordered by id.
    #[instrument(skip_all, name = "latte.repo.list_lattes")]
    pub async fn list(pool: &PgPool) -> Result<Vec<Latte>, ApiError> {
        let start = Instant::now();

        let rows = sqlx::query("SELECT id, title, ingredients FROM latte ORDER BY id")
            .fetch_all(pool)
            .await
            .map_err(|e| observe_error("list_lattes", start, e))?;

        metrics::record_db_query("list_lattes", "success", start.elapsed());

        rows.into_iter()
            .map(|row| map_row(&row).and_then(Latte::try_from))
            .collect()
    }

    /// Fetch one latte.
    ///
    /// Returns `None` if no latte has this id.
    #[instrument(skip_all, name = "latte.repo.get_latte", fields(latte_id = id))]
    pub async fn get(pool: &PgPool, id: i32) -> Result<Option<Latte>, ApiError> {
        let start = Instant::now();

        let row = sqlx::query("SELECT id, title, ingredients FROM latte WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| observe_error("get_latte", start, e))?;

        metrics::record_db_query("get_latte", "success", start.elapsed());

        row.map(|row| map_row(&row).and_then(Latte::try_from))
            .transpose()
    }

    /// Insert a latte. A duplicate title fails with a conflict.
    #[instrument(skip_all, name = "latte.repo.insert_latte")]
    pub async fn insert(pool: &PgPool, latte: &NewLatte) -> Result<Latte, ApiError> {
        let start = Instant::now();
        let ingredients = encode_ingredients(&latte.ingredients)?;

        let row = sqlx::query(
            r#"
            INSERT INTO latte (title, ingredients)
            VALUES ($1, $2)
            RETURNING id, title, ingredients
            "#,
        )
        .bind(&latte.title)
        .bind(&ingredients)
        .fetch_one(pool)
        .await
        .map_err(|e| observe_error("insert_latte", start, e))?;

        metrics::record_db_query("insert_latte", "success", start.elapsed());

        Latte::try_from(map_row(&row)?)
    }

    /// Apply a partial update.
    ///
    /// Returns `None` if no latte has this id.
    #[instrument(skip_all, name = "latte.repo.update_latte", fields(latte_id = id))]
    pub async fn update(
        pool: &PgPool,
        id: i32,
        changes: &LatteChanges,
    ) -> Result<Option<Latte>, ApiError> {
        let start = Instant::now();
        let ingredients = changes
            .ingredients
            .as_deref()
            .map(encode_ingredients)
            .transpose()?;

        let row = sqlx::query(
            r#"
            UPDATE latte
            SET title = COALESCE($2, title),
                ingredients = COALESCE($3, ingredients)
            WHERE id = $1
            RETURNING id, title, ingredients
            "#,
        )
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(ingredients.as_deref())
        .fetch_optional(pool)
        .await
        .map_err(|e| observe_error("update_latte", start, e))?;

        metrics::record_db_query("update_latte", "success", start.elapsed());

        row.map(|row| map_row(&row).and_then(Latte::try_from))
            .transpose()
    }

    /// Delete a latte. Returns `false` if no latte has this id.
    #[instrument(skip_all, name = "latte.repo.delete_latte", fields(latte_id = id))]
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, ApiError> {
        let start = Instant::now();

        let result = sqlx::query("DELETE FROM latte WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| observe_error("delete_latte", start, e))?;

        metrics::record_db_query("delete_latte", "success", start.elapsed());

        Ok(result.rows_affected() > 0)
    }
}

fn observe_error(operation: &str, start: Instant, err: sqlx::Error) -> ApiError {
    metrics::record_db_query(operation, "error", start.elapsed());
    tracing::debug!(target: "latte.repo.lattes", operation, error = %err, "Query failed");
    ApiError::from(err)
}

fn map_row(row: &sqlx::postgres::PgRow) -> Result<LatteRow, ApiError> {
    Ok(LatteRow {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        ingredients: row.try_get("ingredients")?,
    })
}
