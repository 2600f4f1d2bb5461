//! Bearer-token authorization against a third-party identity provider.
//!
//! A protected operation names a permission string and an audience. The
//! request's bearer token is extracted, verified against the provider's
//! JWKS, and its `permissions` claim checked before the operation runs.

pub mod authenticator;
pub mod bearer;
pub mod claims;
pub mod error;
pub mod jwks;
pub mod jwt;

pub use authenticator::{AccessRequirement, Authenticator};
pub use bearer::extract_bearer_token;
pub use claims::{check_permission, Audience, ClaimSet, Permissions};
pub use error::AuthError;
pub use jwks::{Jwk, JwkSet, JwksClient, JwksError, KeySet};
pub use jwt::{TokenVerifier, UnverifiedHeader};
