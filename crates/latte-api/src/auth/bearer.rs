//! Bearer token extraction from the `Authorization` header.

use crate::auth::error::AuthError;
use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Expected authorization scheme, compared case-insensitively.
pub const BEARER_SCHEME: &str = "bearer";

/// Extract the raw token from `Authorization: Bearer <token>`.
///
/// The header value is split on single spaces and must yield exactly two
/// parts, the first of which is the bearer scheme. A value that is not
/// visible ASCII is treated as an absent header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "latte.auth.bearer", "Missing Authorization header");
            AuthError::MissingAuthorizationHeader
        })?;

    let mut parts = value.split(' ');
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => {
            tracing::debug!(target: "latte.auth.bearer", "Authorization header is not two parts");
            return Err(AuthError::MissingAuthorizationElements);
        }
    };

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        tracing::debug!(target: "latte.auth.bearer", "Authorization scheme is not bearer");
        return Err(AuthError::InvalidScheme);
    }

    Ok(token)
}
