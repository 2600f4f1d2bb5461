//! HTTP metrics middleware.
//!
//! Records every response, including ones produced before a handler runs:
//! authorization rejections, JSON body rejections, 404 fallbacks and 405s.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Record method, normalized path, status and duration for each request.
///
/// Applied as the outermost layer.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed());

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn handler_200() -> &'static str {
        "OK"
    }

    async fn handler_502() -> (StatusCode, &'static str) {
        (StatusCode::BAD_GATEWAY, "db down")
    }

    fn test_app() -> Router {
        Router::new()
            .route("/api/latte", get(handler_200))
            .route("/api/project", get(handler_502))
            .layer(middleware::from_fn(http_metrics_middleware))
    }

    async fn status_of(uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        test_app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_middleware_passes_success_through() {
        assert_eq!(status_of("/api/latte").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_passes_error_through() {
        assert_eq!(status_of("/api/project").await, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_middleware_sees_unrouted_requests() {
        assert_eq!(status_of("/nowhere").await, StatusCode::NOT_FOUND);
    }
}
