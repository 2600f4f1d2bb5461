//! Latte endpoint integration tests.
//!
//! Runs the full router over HTTP with in-memory storage and a mocked JWKS.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use anyhow::Result;
use latte_api::models::{Ingredient, NewLatte};
use latte_api::services::InMemoryLatteStore;
use latte_test_utils::*;
use serde_json::{json, Value};

const ALL_LATTE_PERMISSIONS: [&str; 4] = ["get:latte", "post:latte", "patch:latte", "delete:latte"];

struct Fixture {
    keypair: TestKeypair,
    _jwks: MockJwks,
    server: TestApiServer,
    client: reqwest::Client,
}

impl Fixture {
    async fn new() -> Result<Self> {
        Self::with_store(InMemoryLatteStore::new()).await
    }

    async fn with_store(store: InMemoryLatteStore) -> Result<Self> {
        let keypair = TestKeypair::primary();
        let jwks = MockJwks::serving(&[&keypair]).await;
        let server = TestApiServer::spawn_with(&jwks.url(), store, &[]).await?;
        Ok(Self {
            keypair,
            _jwks: jwks,
            server,
            client: reqwest::Client::new(),
        })
    }

    async fn seeded() -> Result<Self> {
        let store = InMemoryLatteStore::with_lattes(vec![
            new_latte("Flat White", "milk"),
            new_latte("Cortado", "espresso"),
        ])
        .await?;
        Self::with_store(store).await
    }

    fn token(&self, permissions: &[&str]) -> String {
        self.keypair.sign(
            &TestTokenBuilder::new()
                .audience("latte")
                .permissions(permissions)
                .build(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.url(), path)
    }
}

fn new_latte(title: &str, ingredient: &str) -> NewLatte {
    NewLatte {
        title: title.to_string(),
        ingredients: vec![Ingredient {
            color: "#fff".to_string(),
            name: ingredient.to_string(),
            parts: 1.into(),
        }],
    }
}

fn mocha() -> Value {
    json!({
        "title": "Mocha",
        "ingredients": [
            {"color": "#3b2f2f", "name": "espresso", "parts": 1},
            {"color": "#7b3f00", "name": "chocolate", "parts": 0.5}
        ]
    })
}

// ============================================================================
// Public reads
// ============================================================================

#[tokio::test]
async fn test_list_lattes_is_public() -> Result<()> {
    let fx = Fixture::seeded().await?;

    let response = fx.client.get(fx.url("/api/latte")).send().await?;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["lattes"].as_array().unwrap().len(), 2);
    assert_eq!(body["lattes"][0]["id"], 1);
    assert_eq!(body["lattes"][0]["title"], "Flat White");
    assert_eq!(body["lattes"][0]["ingredients"][0]["name"], "milk");
    Ok(())
}

#[tokio::test]
async fn test_get_latte_by_id() -> Result<()> {
    let fx = Fixture::seeded().await?;

    let body: Value = fx.client.get(fx.url("/api/latte/2")).send().await?.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["lattes"]["id"], 2);
    assert_eq!(body["lattes"]["title"], "Cortado");
    Ok(())
}

#[tokio::test]
async fn test_get_missing_latte_is_404() -> Result<()> {
    let fx = Fixture::new().await?;

    let response = fx.client.get(fx.url("/api/latte/42")).send().await?;
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await?;
    assert_eq!(body, json!({"success": false, "error": 404, "message": "Not found"}));
    Ok(())
}

#[tokio::test]
async fn test_latte_detail_requires_get_permission() -> Result<()> {
    let fx = Fixture::seeded().await?;

    let denied = fx
        .client
        .get(fx.url("/api/latte-detail"))
        .bearer_auth(fx.token(&["post:latte"]))
        .send()
        .await?;
    assert_eq!(denied.status(), 401);
    let body: Value = denied.json().await?;
    assert_eq!(body["message"], "User don't have access to resource.");

    let allowed = fx
        .client
        .get(fx.url("/api/latte-detail"))
        .bearer_auth(fx.token(&["get:latte"]))
        .send()
        .await?;
    assert_eq!(allowed.status(), 200);
    let body: Value = allowed.json().await?;
    assert_eq!(body["lattes"].as_array().unwrap().len(), 2);
    Ok(())
}

// ============================================================================
// Guarded writes
// ============================================================================

#[tokio::test]
async fn test_create_latte() -> Result<()> {
    let fx = Fixture::new().await?;

    let response = fx
        .client
        .post(fx.url("/api/latte"))
        .bearer_auth(fx.token(&["post:latte"]))
        .json(&mocha())
        .send()
        .await?;
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["lattes"][0]["id"], 1);
    assert_eq!(body["lattes"][0]["title"], "Mocha");
    assert_eq!(body["lattes"][0]["ingredients"][1]["parts"], 0.5);
    assert_eq!(fx.server.lattes().len().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_create_without_token_never_touches_store() -> Result<()> {
    let fx = Fixture::new().await?;

    let response = fx
        .client
        .post(fx.url("/api/latte"))
        .header("content-type", "application/json")
        .body("{ this is not json")
        .send()
        .await?;

    // Authorization runs before the body is parsed
    assert_eq!(response.status(), 401);
    assert!(fx.server.lattes().is_empty().await);
    Ok(())
}

#[tokio::test]
async fn test_create_with_wrong_permission_is_401() -> Result<()> {
    let fx = Fixture::new().await?;

    let response = fx
        .client
        .post(fx.url("/api/latte"))
        .bearer_auth(fx.token(&["get:latte", "patch:latte"]))
        .json(&mocha())
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    assert!(fx.server.lattes().is_empty().await);
    Ok(())
}

#[tokio::test]
async fn test_create_with_invalid_bodies_is_400() -> Result<()> {
    let fx = Fixture::new().await?;
    let token = fx.token(&["post:latte"]);

    let bodies = [
        json!({"title": "Mocha"}),
        json!({"title": "Mocha!", "ingredients": []}),
        json!({"title": "", "ingredients": []}),
        json!({"title": "x".repeat(81), "ingredients": []}),
        json!({"title": "Mocha", "ingredients": [{"color": "#000", "name": "espresso"}]}),
    ];

    for body in bodies {
        let response = fx
            .client
            .post(fx.url("/api/latte"))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        assert_eq!(response.status(), 400, "body: {body}");
        let error: Value = response.json().await?;
        assert_eq!(error["error"], 400);
        assert_eq!(error["message"], "Bad request");
    }

    assert!(fx.server.lattes().is_empty().await);
    Ok(())
}

#[tokio::test]
async fn test_create_duplicate_title_is_409() -> Result<()> {
    let fx = Fixture::seeded().await?;

    let response = fx
        .client
        .post(fx.url("/api/latte"))
        .bearer_auth(fx.token(&["post:latte"]))
        .json(&json!({"title": "Cortado", "ingredients": []}))
        .send()
        .await?;

    assert_eq!(response.status(), 409);
    assert_eq!(fx.server.lattes().len().await, 2);
    Ok(())
}

#[tokio::test]
async fn test_update_latte_title_only() -> Result<()> {
    let fx = Fixture::seeded().await?;

    let response = fx
        .client
        .patch(fx.url("/api/latte/1"))
        .bearer_auth(fx.token(&["patch:latte"]))
        .json(&json!({"title": "Oat Flat White"}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await?;
    assert_eq!(body["lattes"][0]["id"], 1);
    assert_eq!(body["lattes"][0]["title"], "Oat Flat White");
    assert_eq!(body["lattes"][0]["ingredients"][0]["name"], "milk");
    Ok(())
}

#[tokio::test]
async fn test_update_with_empty_body_is_400() -> Result<()> {
    let fx = Fixture::seeded().await?;

    let response = fx
        .client
        .patch(fx.url("/api/latte/1"))
        .bearer_auth(fx.token(&["patch:latte"]))
        .json(&json!({}))
        .send()
        .await?;

    assert_eq!(response.status(), 400);
    Ok(())
}

#[tokio::test]
async fn test_update_missing_latte_is_404() -> Result<()> {
    let fx = Fixture::new().await?;

    let response = fx
        .client
        .patch(fx.url("/api/latte/7"))
        .bearer_auth(fx.token(&["patch:latte"]))
        .json(&json!({"title": "Ghost"}))
        .send()
        .await?;

    assert_eq!(response.status(), 404);
    Ok(())
}

#[tokio::test]
async fn test_delete_latte() -> Result<()> {
    let fx = Fixture::seeded().await?;

    let response = fx
        .client
        .delete(fx.url("/api/latte/2"))
        .bearer_auth(fx.token(&ALL_LATTE_PERMISSIONS))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await?;
    assert_eq!(body, json!({"success": true, "delete": 2}));
    assert_eq!(fx.server.lattes().len().await, 1);

    let again = fx
        .client
        .delete(fx.url("/api/latte/2"))
        .bearer_auth(fx.token(&ALL_LATTE_PERMISSIONS))
        .send()
        .await?;
    assert_eq!(again.status(), 404);
    Ok(())
}

#[tokio::test]
async fn test_non_integer_id_is_404() -> Result<()> {
    let fx = Fixture::new().await?;

    let response = fx.client.get(fx.url("/api/latte/espresso")).send().await?;
    assert_eq!(response.status(), 404);
    Ok(())
}

#[tokio::test]
async fn test_unsupported_method_is_405() -> Result<()> {
    let fx = Fixture::new().await?;

    let response = fx.client.put(fx.url("/api/latte/1")).send().await?;
    assert_eq!(response.status(), 405);

    let body: Value = response.json().await?;
    assert_eq!(
        body,
        json!({"success": false, "error": 405, "message": "Method not allowed"})
    );
    Ok(())
}

#[tokio::test]
async fn test_unavailable_store_is_502() -> Result<()> {
    let fx = Fixture::with_store(InMemoryLatteStore::unavailable()).await?;

    let response = fx.client.get(fx.url("/api/latte")).send().await?;
    assert_eq!(response.status(), 502);

    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Bad gateway");
    Ok(())
}
