//! Latte API Library
//!
//! This library provides the core functionality for the latte API, a small
//! REST service for a latte catalogue and a project portfolio whose write
//! endpoints are protected by Auth0-issued bearer tokens:
//!
//! - Bearer-token extraction from the `Authorization` header
//! - RS256 signature verification against the identity provider's JWKS
//! - Issuer, audience and expiry validation
//! - Per-endpoint permission checks
//!
//! # Architecture
//!
//! Handler -> Service -> Repository, with authorization applied as
//! per-method route middleware:
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> services/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Token extraction, verification and permission checks
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Permission guard, metrics and 405 envelope layers
//! - `models` - Data models and request validation
//! - `observability` - Prometheus metrics
//! - `repositories` - PostgreSQL queries
//! - `routes` - Axum router setup
//! - `services` - Storage traits with PostgreSQL and in-memory implementations

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
