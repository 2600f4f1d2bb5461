//! Latte catalogue models.

use crate::errors::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Maximum title length (matches the `latte.title` column).
pub const MAX_TITLE_LEN: usize = 80;

/// Maximum serialized ingredients length (matches the `latte.ingredients` column).
pub const MAX_INGREDIENTS_LEN: usize = 180;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub color: String,
    pub name: String,
    pub parts: Number,
}

/// A latte in its long representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Latte {
    pub id: i32,
    pub title: String,
    pub ingredients: Vec<Ingredient>,
}

/// Latte row as stored; `ingredients` is a JSON document.
#[derive(Debug, Clone)]
pub struct LatteRow {
    pub id: i32,
    pub title: String,
    pub ingredients: String,
}

impl TryFrom<LatteRow> for Latte {
    type Error = ApiError;

    fn try_from(row: LatteRow) -> Result<Self, Self::Error> {
        let ingredients = serde_json::from_str(&row.ingredients).map_err(|e| {
            ApiError::Database(format!("latte {} has unreadable ingredients: {}", row.id, e))
        })?;
        Ok(Latte {
            id: row.id,
            title: row.title,
            ingredients,
        })
    }
}

/// Validated input for a new latte.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLatte {
    pub title: String,
    pub ingredients: Vec<Ingredient>,
}

/// Validated partial update; at least one field is set.
#[derive(Debug, Clone, PartialEq)]
pub struct LatteChanges {
    pub title: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
}

/// Request body for `POST /api/latte`.
#[derive(Debug, Deserialize)]
pub struct CreateLatteRequest {
    pub title: String,
    pub ingredients: Vec<Ingredient>,
}

impl CreateLatteRequest {
    pub fn validate(self) -> Result<NewLatte, ApiError> {
        validate_title(&self.title)?;
        validate_ingredients(&self.ingredients)?;
        Ok(NewLatte {
            title: self.title,
            ingredients: self.ingredients,
        })
    }
}

/// Request body for `PATCH /api/latte/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateLatteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ingredients: Option<Vec<Ingredient>>,
}

impl UpdateLatteRequest {
    pub fn validate(self) -> Result<LatteChanges, ApiError> {
        if self.title.is_none() && self.ingredients.is_none() {
            return Err(ApiError::BadRequest(
                "update must set title or ingredients".to_string(),
            ));
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(ingredients) = &self.ingredients {
            validate_ingredients(ingredients)?;
        }
        Ok(LatteChanges {
            title: self.title,
            ingredients: self.ingredients,
        })
    }
}

/// Titles may only contain letters, digits, underscores and spaces.
pub fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::BadRequest(format!(
            "title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    if !title
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == ' ')
    {
        return Err(ApiError::BadRequest(
            "title contains characters other than letters, digits, underscores or spaces"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_ingredients(ingredients: &[Ingredient]) -> Result<(), ApiError> {
    if encode_ingredients(ingredients)?.len() > MAX_INGREDIENTS_LEN {
        return Err(ApiError::BadRequest(format!(
            "ingredients exceed {MAX_INGREDIENTS_LEN} characters when stored"
        )));
    }
    Ok(())
}

/// Serialize ingredients to their stored JSON form.
pub fn encode_ingredients(ingredients: &[Ingredient]) -> Result<String, ApiError> {
    serde_json::to_string(ingredients).map_err(|e| {
        tracing::error!(target: "latte.models", error = %e, "Failed to encode ingredients");
        ApiError::Internal
    })
}

/// Envelope for latte responses: `{"success": true, "lattes": ...}`.
#[derive(Debug, Serialize)]
pub struct LattesResponse<T> {
    pub success: bool,
    pub lattes: T,
}

impl<T> LattesResponse<T> {
    pub fn new(lattes: T) -> Self {
        Self {
            success: true,
            lattes,
        }
    }
}

/// Response for `DELETE /api/latte/{id}`.
#[derive(Debug, Serialize)]
pub struct DeleteLatteResponse {
    pub success: bool,
    pub delete: i32,
}
