//! Bearer token verification.
//!
//! Tokens are verified against the identity provider's published RSA keys.
//! Only RS256 is accepted. The issuer is fixed to `https://<auth-domain>/`
//! and the audience is supplied per call.
//!
//! Order of operations:
//!
//! 1. Fetch the signing-key set
//! 2. Parse the unverified header and read its `kid`
//! 3. Select the matching key (refetching once if the set was cached)
//! 4. Verify signature, expiry, audience and issuer

use crate::auth::claims::ClaimSet;
use crate::auth::error::AuthError;
use crate::auth::jwks::{Jwk, JwksClient};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::instrument;

/// Maximum accepted token size in bytes.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Signature algorithms accepted for bearer tokens.
pub const ALLOWED_ALGORITHMS: [Algorithm; 1] = [Algorithm::RS256];

/// Header of a token whose signature has not been checked yet.
#[derive(Debug, Clone)]
pub struct UnverifiedHeader {
    fields: Map<String, Value>,
}

impl UnverifiedHeader {
    /// Decode the header segment of `token`.
    ///
    /// The token must have three dot-separated base64url segments and a
    /// header that decodes to a JSON object.
    pub fn parse(token: &str) -> Result<Self, AuthError> {
        if token.len() > MAX_TOKEN_SIZE_BYTES {
            tracing::debug!(
                target: "latte.auth.jwt",
                token_size = token.len(),
                max_size = MAX_TOKEN_SIZE_BYTES,
                "Token rejected: size exceeds maximum"
            );
            return Err(AuthError::MalformedTokenHeader);
        }

        let segments: Vec<&str> = token.split('.').collect();
        let [header_b64, payload_b64, signature_b64] = segments.as_slice() else {
            tracing::debug!(target: "latte.auth.jwt", "Token is not three segments");
            return Err(AuthError::MalformedTokenHeader);
        };

        let header_bytes = URL_SAFE_NO_PAD.decode(header_b64).map_err(|e| {
            tracing::debug!(target: "latte.auth.jwt", error = %e, "Token header is not base64url");
            AuthError::MalformedTokenHeader
        })?;

        if URL_SAFE_NO_PAD.decode(payload_b64).is_err()
            || URL_SAFE_NO_PAD.decode(signature_b64).is_err()
        {
            tracing::debug!(target: "latte.auth.jwt", "Token payload or signature is not base64url");
            return Err(AuthError::MalformedTokenHeader);
        }

        let fields: Map<String, Value> = serde_json::from_slice(&header_bytes).map_err(|e| {
            tracing::debug!(target: "latte.auth.jwt", error = %e, "Token header is not a JSON object");
            AuthError::MalformedTokenHeader
        })?;

        Ok(Self { fields })
    }

    /// The raw `kid` value.
    ///
    /// Fails with [`AuthError::MissingKeyId`] if the header has no `kid`. A
    /// non-string `kid` is returned as-is and will not match any key.
    pub fn kid(&self) -> Result<&Value, AuthError> {
        self.fields.get("kid").ok_or_else(|| {
            tracing::debug!(target: "latte.auth.jwt", "Token header has no kid");
            AuthError::MissingKeyId
        })
    }

    pub fn alg(&self) -> Option<&str> {
        self.fields.get("alg").and_then(Value::as_str)
    }
}

/// Verifies bearer tokens against the JWKS.
pub struct TokenVerifier {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    leeway_seconds: u64,
}

impl TokenVerifier {
    /// Create a verifier.
    ///
    /// # Arguments
    ///
    /// * `jwks_client` - Client for fetching public keys
    /// * `issuer` - Required `iss` value, e.g. `https://tenant.auth0.com/`
    /// * `leeway_seconds` - Clock skew tolerance for `exp` and `nbf`
    pub fn new(jwks_client: Arc<JwksClient>, issuer: String, leeway_seconds: u64) -> Self {
        Self {
            jwks_client,
            issuer,
            leeway_seconds,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify `token` for `audience` and return its claims.
    ///
    /// A key set that cannot be fetched or parsed is reported as
    /// [`AuthError::UnparseableToken`].
    #[instrument(skip_all, fields(audience = %audience))]
    pub async fn verify(&self, token: &str, audience: &str) -> Result<ClaimSet, AuthError> {
        let key_set = self.jwks_client.key_set().await.map_err(|e| {
            tracing::warn!(target: "latte.auth.jwt", error = %e, "Signing keys unavailable");
            AuthError::UnparseableToken
        })?;

        let header = UnverifiedHeader::parse(token)?;
        let kid = header.kid()?.as_str();
        tracing::debug!(target: "latte.auth.jwt", alg = ?header.alg(), kid = ?kid, "Token header parsed");

        let jwk = match kid.and_then(|kid| key_set.find(kid)) {
            Some(jwk) => jwk.clone(),
            None => match kid {
                Some(kid) if key_set.is_cached() => {
                    tracing::debug!(target: "latte.auth.jwt", kid = %kid, "Key not in cached JWKS, refetching");
                    let refreshed = self.jwks_client.refresh().await.map_err(|e| {
                        tracing::warn!(target: "latte.auth.jwt", error = %e, "Signing keys unavailable");
                        AuthError::UnparseableToken
                    })?;
                    refreshed.find(kid).cloned().ok_or_else(|| {
                        tracing::debug!(
                            target: "latte.auth.jwt",
                            kid = %kid,
                            key_count = refreshed.len(),
                            "No signing key for kid"
                        );
                        AuthError::SigningKeyNotFound
                    })?
                }
                _ => {
                    tracing::debug!(
                        target: "latte.auth.jwt",
                        key_count = key_set.len(),
                        "No signing key for kid"
                    );
                    return Err(AuthError::SigningKeyNotFound);
                }
            },
        };

        let claims = verify_with_key(token, &jwk, &self.validation(audience))?;
        if !claims.aud.contains(audience) {
            return Err(AuthError::IncorrectClaims);
        }

        tracing::debug!(target: "latte.auth.jwt", "Token verified");
        Ok(claims)
    }

    fn validation(&self, audience: &str) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = ALLOWED_ALGORITHMS.to_vec();
        validation.leeway = self.leeway_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_audience(&[audience]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation
    }
}

/// Verify the token signature with `jwk` and validate its claims.
fn verify_with_key(token: &str, jwk: &Jwk, validation: &Validation) -> Result<ClaimSet, AuthError> {
    if jwk.kty != "RSA" {
        tracing::warn!(target: "latte.auth.jwt", kty = %jwk.kty, "Unexpected JWK key type");
        return Err(AuthError::UnparseableToken);
    }

    let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
        tracing::warn!(target: "latte.auth.jwt", "JWK missing RSA components");
        return Err(AuthError::UnparseableToken);
    };

    let decoding_key = DecodingKey::from_rsa_components(n, e).map_err(|e| {
        tracing::warn!(target: "latte.auth.jwt", error = %e, "Invalid RSA key material");
        AuthError::UnparseableToken
    })?;

    // Decoded as a raw value so that a missing or mistyped `iss`/`aud`
    // reaches claim validation instead of failing deserialization.
    let token_data = decode::<Value>(token, &decoding_key, validation).map_err(|e| {
        tracing::debug!(target: "latte.auth.jwt", error = %e, "Token verification failed");
        classify_decode_error(e.kind())
    })?;

    serde_json::from_value(token_data.claims).map_err(|e| {
        tracing::debug!(target: "latte.auth.jwt", error = %e, "Validated claims have an unexpected shape");
        AuthError::UnparseableToken
    })
}

/// Map a decode failure onto the client-facing taxonomy.
fn classify_decode_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer | ErrorKind::ImmatureSignature => {
            AuthError::IncorrectClaims
        }
        ErrorKind::MissingRequiredClaim(claim) if claim == "aud" || claim == "iss" => {
            AuthError::IncorrectClaims
        }
        _ => AuthError::UnparseableToken,
    }
}
