//! Metrics definitions for the Latte API.
//!
//! All metrics follow Prometheus naming conventions:
//! - `latte_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: parameterized paths, unknown paths collapse to `/other`
//! - `status`: 3 values (success, error, timeout)
//! - `reason`: bounded by `AuthError` variants
//! - `operation`: bounded by repository functions

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("latte_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Key fetches cross the network to the identity provider
        .set_buckets_for_metric(
            Matcher::Prefix("latte_jwks_fetch".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set JWKS fetch buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("latte_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `latte_http_requests_total`, `latte_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("latte_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("latte_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
///
/// Replaces numeric ids with `{id}`.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/" | "/health" | "/metrics" | "/api/latte" | "/api/latte-detail" | "/api/project" => {
            return path.to_string();
        }
        _ => {}
    }

    for prefix in ["/api/latte/", "/api/project/"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            if !rest.is_empty() && !rest.contains('/') {
                return format!("{prefix}{{id}}");
            }
        }
    }

    "/other".to_string()
}

// ============================================================================
// Authorization Metrics
// ============================================================================

/// Record a rejected authorization attempt.
///
/// Metric: `latte_auth_failures_total`
/// Labels: `code`, `reason`
pub fn record_auth_failure(status_code: u16, reason: &'static str) {
    counter!("latte_auth_failures_total",
        "code" => status_code.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Record a JWKS fetch.
///
/// Metric: `latte_jwks_fetch_total`, `latte_jwks_fetch_duration_seconds`
/// Labels: `status`
pub fn record_jwks_fetch(status: &str, duration: Duration) {
    histogram!("latte_jwks_fetch_duration_seconds").record(duration.as_secs_f64());

    counter!("latte_jwks_fetch_total",
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record database query execution
///
/// Metric: `latte_db_queries_total`, `latte_db_query_duration_seconds`
/// Labels: `operation`, `status`
pub fn record_db_query(operation: &str, status: &str, duration: Duration) {
    histogram!("latte_db_query_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("latte_db_queries_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
