//! Prometheus metrics endpoint handler.
//!
//! This endpoint is unauthenticated to allow Prometheus to scrape metrics.
//! Labels carry only bounded operational values, never token material.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus-formatted metrics for scraping:
/// ```text
/// # TYPE latte_http_requests_total counter
/// latte_http_requests_total{method="GET",endpoint="/api/latte",status_code="200"} 42
/// ```
#[tracing::instrument(skip_all, name = "latte.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
