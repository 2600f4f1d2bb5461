//! Composition of extraction, verification and permission checking.

use crate::auth::bearer::extract_bearer_token;
use crate::auth::claims::{check_permission, ClaimSet};
use crate::auth::error::AuthError;
use crate::auth::jwks::{JwksClient, JwksError};
use crate::auth::jwt::TokenVerifier;
use crate::config::AuthConfig;
use crate::observability::metrics;
use axum::http::HeaderMap;
use std::future::Future;
use std::sync::Arc;
use tracing::instrument;

/// The permission string and audience a protected operation demands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequirement {
    pub permission: String,
    pub audience: String,
}

impl AccessRequirement {
    pub fn new(permission: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
            audience: audience.into(),
        }
    }
}

/// Authorizes requests from their headers.
pub struct Authenticator {
    verifier: TokenVerifier,
}

impl Authenticator {
    /// Build an authenticator, and its JWKS client, from configuration.
    pub fn new(config: &AuthConfig) -> Result<Self, JwksError> {
        let jwks_client = Arc::new(JwksClient::with_options(
            config.jwks_url.clone(),
            config.jwks_cache_ttl,
            config.jwks_fetch_timeout,
        )?);
        tracing::info!(
            target: "latte.auth",
            jwks_url = %jwks_client.jwks_url(),
            cache_ttl_seconds = jwks_client.cache_ttl().as_secs(),
            issuer = %config.issuer(),
            "Authenticator configured"
        );
        Ok(Self::from_verifier(TokenVerifier::new(
            jwks_client,
            config.issuer(),
            config.leeway_seconds,
        )))
    }

    pub fn from_verifier(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// Extract, verify and permission-check the request's bearer token.
    ///
    /// The `Authorization` header is checked before any key fetch, so a
    /// request without a token never reaches the network.
    #[instrument(
        skip_all,
        name = "latte.auth.authorize",
        fields(permission = %requirement.permission, audience = %requirement.audience)
    )]
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        requirement: &AccessRequirement,
    ) -> Result<ClaimSet, AuthError> {
        let result = self.authorize_inner(headers, requirement).await;

        if let Err(err) = &result {
            tracing::info!(
                target: "latte.auth",
                status = err.status_code(),
                reason = err.reason(),
                "Authorization rejected"
            );
            metrics::record_auth_failure(err.status_code(), err.reason());
        }

        result
    }

    async fn authorize_inner(
        &self,
        headers: &HeaderMap,
        requirement: &AccessRequirement,
    ) -> Result<ClaimSet, AuthError> {
        let token = extract_bearer_token(headers)?;
        let claims = self.verifier.verify(token, &requirement.audience).await?;
        check_permission(&requirement.permission, &claims)?;
        tracing::debug!(
            target: "latte.auth",
            permissions = ?claims.permission_list(),
            expires_at = ?claims.expires_at(),
            "Authorization granted"
        );
        Ok(claims)
    }

    /// Run `operation` with the verified claims, only if authorization succeeds.
    ///
    /// Any [`AuthError`] is returned unchanged and `operation` is never invoked.
    pub async fn guard<F, Fut, T>(
        &self,
        headers: &HeaderMap,
        requirement: &AccessRequirement,
        operation: F,
    ) -> Result<T, AuthError>
    where
        F: FnOnce(ClaimSet) -> Fut,
        Fut: Future<Output = T>,
    {
        let claims = self.authorize(headers, requirement).await?;
        Ok(operation(claims).await)
    }
}
