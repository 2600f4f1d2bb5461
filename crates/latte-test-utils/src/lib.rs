//! # Latte Test Utilities
//!
//! Shared test utilities for the latte API.
//!
//! This crate provides:
//! - Deterministic RSA keypairs that sign RS256 tokens (`TestKeypair`)
//! - Claim builders for Auth0-shaped access tokens (`TestTokenBuilder`)
//! - A wiremock-backed JWKS endpoint (`MockJwks`)
//! - Server test harness (`TestApiServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use latte_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let keypair = TestKeypair::primary();
//!     let jwks = MockJwks::serving(&[&keypair]).await;
//!     let server = TestApiServer::spawn(&jwks.url()).await?;
//!
//!     let token = keypair.sign(&TestTokenBuilder::new().permissions(&["post:latte"]).build());
//!     let response = reqwest::Client::new()
//!         .post(format!("{}/api/latte", server.url()))
//!         .bearer_auth(token)
//!         .json(&serde_json::json!({"title": "Mocha", "ingredients": []}))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 201);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_server;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_server::*;
pub use server_harness::*;
pub use token_builders::*;
