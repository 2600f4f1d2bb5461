//! Rewrites framework-generated 405 responses into the JSON error envelope.
//!
//! The router answers a known path with an unsupported method by itself,
//! with an empty body. The `Allow` header is preserved.

use crate::errors::ApiError;
use axum::{
    extract::Request,
    http::{header::ALLOW, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub async fn method_not_allowed_envelope(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(ALLOW).cloned();
    let mut rewritten = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        rewritten.headers_mut().insert(ALLOW, allow);
    }
    rewritten
}
