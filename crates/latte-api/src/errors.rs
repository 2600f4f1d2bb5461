//! Latte API error types.
//!
//! Every error renders as `{"success": false, "error": <code>, "message": <text>}`.
//! Authorization failures carry their own description; other messages are
//! generic and the underlying cause is logged server-side.

use crate::auth::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Latte API error type.
///
/// Maps to HTTP status codes:
/// - Auth: 400 or 401 depending on the failure
/// - BadRequest: 400 Bad Request
/// - NotFound: 404 Not Found
/// - MethodNotAllowed: 405 Method Not Allowed
/// - Conflict: 409 Conflict
/// - Database, Internal: 500 Internal Server Error
/// - BadGateway: 502 Bad Gateway (database unreachable)
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database unavailable: {0}")]
    BadGateway(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Auth(err) => err.status_code(),
            ApiError::BadRequest(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::MethodNotAllowed => 405,
            ApiError::Conflict(_) => 409,
            ApiError::Database(_) | ApiError::Internal => 500,
            ApiError::BadGateway(_) => 502,
        }
    }

    /// Message returned to the client.
    fn client_message(&self) -> String {
        match self {
            ApiError::Auth(err) => err.description(),
            ApiError::BadRequest(_) => "Bad request".to_string(),
            ApiError::NotFound(_) => "Not found".to_string(),
            ApiError::MethodNotAllowed => "Method not allowed".to_string(),
            ApiError::Conflict(_) => "Conflict".to_string(),
            ApiError::BadGateway(_) => "Bad gateway".to_string(),
            ApiError::Database(_) | ApiError::Internal => "Server error".to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(err) => {
                tracing::error!(target: "latte.database", error = %err, "Database operation failed");
            }
            ApiError::BadGateway(err) => {
                tracing::warn!(target: "latte.database", error = %err, "Database unavailable");
            }
            ApiError::BadRequest(reason) | ApiError::NotFound(reason) | ApiError::Conflict(reason) => {
                tracing::debug!(target: "latte.errors", reason = %reason, "Request rejected");
            }
            ApiError::Auth(_) | ApiError::MethodNotAllowed | ApiError::Internal => {}
        }

        let code = self.status_code();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = ErrorResponse {
            success: false,
            error: code,
            message: self.client_message(),
        };

        let mut response = (status, Json(body)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer realm=\"latte-api\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

/// Classify sqlx errors: missing rows are 404, unique violations 409,
/// connectivity failures 502, everything else 500.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => ApiError::BadGateway(err.to_string()),
            _ => ApiError::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    // Helper function to read the response body as JSON
    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Auth(AuthError::TokenExpired).status_code(), 401);
        assert_eq!(
            ApiError::Auth(AuthError::SigningKeyNotFound).status_code(),
            400
        );
        assert_eq!(ApiError::BadRequest("x".to_string()).status_code(), 400);
        assert_eq!(ApiError::NotFound("x".to_string()).status_code(), 404);
        assert_eq!(ApiError::MethodNotAllowed.status_code(), 405);
        assert_eq!(ApiError::Conflict("x".to_string()).status_code(), 409);
        assert_eq!(ApiError::BadGateway("x".to_string()).status_code(), 502);
        assert_eq!(ApiError::Database("x".to_string()).status_code(), 500);
        assert_eq!(ApiError::Internal.status_code(), 500);
    }

    #[test]
    fn test_display_auth_is_transparent() {
        let error = ApiError::from(AuthError::MissingKeyId);
        assert_eq!(format!("{}", error), "Authorization malformed.");
    }

    #[tokio::test]
    async fn test_into_response_auth_401() {
        let response = ApiError::Auth(AuthError::MissingAuthorizationHeader).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let www_auth = response.headers().get("WWW-Authenticate").unwrap();
        assert!(www_auth
            .to_str()
            .unwrap()
            .contains("Bearer realm=\"latte-api\""));

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["success"], false);
        assert_eq!(body_json["error"], 401);
        assert_eq!(body_json["message"], "Missing mandatory headers.");
    }

    #[tokio::test]
    async fn test_into_response_auth_400_has_no_challenge() {
        let response = ApiError::Auth(AuthError::SigningKeyNotFound).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get("WWW-Authenticate").is_none());

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"], 400);
        assert_eq!(body_json["message"], "Unable to find the appropriate key.");
    }

    #[tokio::test]
    async fn test_into_response_database_error_is_generic() {
        let response = ApiError::Database("relation \"latte\" does not exist".to_string())
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"], 500);
        assert_eq!(body_json["message"], "Server error");
    }

    #[tokio::test]
    async fn test_into_response_conflict() {
        let response = ApiError::Conflict("duplicate title".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"], 409);
        assert_eq!(body_json["message"], "Conflict");
    }

    #[tokio::test]
    async fn test_into_response_bad_gateway() {
        let response = ApiError::BadGateway("connection refused".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"], 502);
        assert_eq!(body_json["message"], "Bad gateway");
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error = ApiError::from(sqlx::Error::RowNotFound);
        assert!(matches!(error, ApiError::NotFound(_)));
    }

    #[test]
    fn test_from_sqlx_pool_timeout() {
        let error = ApiError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(error, ApiError::BadGateway(_)));
    }

    #[test]
    fn test_from_sqlx_other() {
        let error = ApiError::from(sqlx::Error::ColumnNotFound("title".to_string()));
        assert!(matches!(error, ApiError::Database(_)));
    }
}
