//! Authorization failure taxonomy.
//!
//! Each variant's `Display` output is the exact description returned to
//! clients. Status codes are either 400 or 401; the key-lookup miss and
//! generic decode failures are 400, everything else is 401.

use thiserror::Error;

/// A typed bearer-token authorization failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing mandatory headers.")]
    MissingAuthorizationHeader,

    #[error("Missing authorization elements.")]
    MissingAuthorizationElements,

    #[error("Unable to find appropriate keywords.")]
    InvalidScheme,

    #[error("Malformed header value.")]
    MalformedTokenHeader,

    #[error("Authorization malformed.")]
    MissingKeyId,

    #[error("Unable to find the appropriate key.")]
    SigningKeyNotFound,

    #[error("Token expired.")]
    TokenExpired,

    #[error("Incorrect claims. Please, check the audience and issuer.")]
    IncorrectClaims,

    #[error("Unable to parse authentication token.")]
    UnparseableToken,

    #[error("Missing mandatory key.")]
    MissingPermissions,

    #[error("User don't have access to resource.")]
    PermissionDenied,
}

impl AuthError {
    /// HTTP status code reported for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::SigningKeyNotFound | AuthError::UnparseableToken => 400,
            AuthError::MissingAuthorizationHeader
            | AuthError::MissingAuthorizationElements
            | AuthError::InvalidScheme
            | AuthError::MalformedTokenHeader
            | AuthError::MissingKeyId
            | AuthError::TokenExpired
            | AuthError::IncorrectClaims
            | AuthError::MissingPermissions
            | AuthError::PermissionDenied => 401,
        }
    }

    /// Human-readable description (same text as `Display`).
    pub fn description(&self) -> String {
        self.to_string()
    }

    /// Bounded label used for the `latte_auth_failures_total` metric.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorizationHeader => "missing_header",
            AuthError::MissingAuthorizationElements => "missing_elements",
            AuthError::InvalidScheme => "invalid_scheme",
            AuthError::MalformedTokenHeader => "malformed_header",
            AuthError::MissingKeyId => "missing_kid",
            AuthError::SigningKeyNotFound => "key_not_found",
            AuthError::TokenExpired => "expired",
            AuthError::IncorrectClaims => "incorrect_claims",
            AuthError::UnparseableToken => "unparseable",
            AuthError::MissingPermissions => "missing_permissions",
            AuthError::PermissionDenied => "permission_denied",
        }
    }
}
