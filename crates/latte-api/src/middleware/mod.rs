//! HTTP middleware for the latte API.
//!
//! # Components
//!
//! - `auth` - Per-method permission guard for protected routes
//! - `http_metrics` - HTTP request metrics
//! - `json_errors` - JSON envelope for router-generated 405s

pub mod auth;
pub mod http_metrics;
pub mod json_errors;

pub use auth::{require_permission, PermissionGuard};
pub use http_metrics::http_metrics_middleware;
pub use json_errors::method_not_allowed_envelope;
