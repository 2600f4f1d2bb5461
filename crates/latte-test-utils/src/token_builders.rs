//! Builder patterns for test token claims
//!
//! Provides a fluent API for Auth0-shaped access-token claims.

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Issuer used by the test harness (`https://<TEST_AUTH_DOMAIN>/`).
pub const TEST_AUTH_DOMAIN: &str = "latte-test.auth0.com";

/// Builder for creating test JWT claims
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .audience("latte")
///     .permissions(&["post:latte"])
///     .expires_in(3600)
///     .build();
/// ```
pub struct TestTokenBuilder {
    iss: String,
    sub: String,
    aud: Value,
    permissions: Option<Value>,
    exp: i64,
    iat: i64,
    nbf: Option<i64>,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Claims for the harness issuer and the `latte` audience, valid for an hour
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            iss: format!("https://{}/", TEST_AUTH_DOMAIN),
            sub: "auth0|test-user".to_string(),
            aud: json!("latte"),
            permissions: Some(json!([])),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            nbf: None,
            extra: Map::new(),
        }
    }

    pub fn issuer(mut self, iss: &str) -> Self {
        self.iss = iss.to_string();
        self
    }

    pub fn subject(mut self, sub: &str) -> Self {
        self.sub = sub.to_string();
        self
    }

    /// Single audience string
    pub fn audience(mut self, aud: &str) -> Self {
        self.aud = json!(aud);
        self
    }

    /// Audience as a list
    pub fn audiences(mut self, aud: &[&str]) -> Self {
        self.aud = json!(aud);
        self
    }

    /// Permissions as a list of strings
    pub fn permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = Some(json!(permissions));
        self
    }

    /// Permissions claim with an arbitrary JSON shape
    pub fn permissions_value(mut self, permissions: Value) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Omit the permissions claim entirely
    pub fn without_permissions(mut self) -> Self {
        self.permissions = None;
        self
    }

    /// Set expiration in seconds from now (negative for an expired token)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set not-before in seconds from now
    pub fn not_before_in(mut self, seconds: i64) -> Self {
        self.nbf = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Add a claim the verifier does not interpret
    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = self.extra;
        claims.insert("iss".to_string(), json!(self.iss));
        claims.insert("sub".to_string(), json!(self.sub));
        claims.insert("aud".to_string(), self.aud);
        claims.insert("exp".to_string(), json!(self.exp));
        claims.insert("iat".to_string(), json!(self.iat));
        if let Some(nbf) = self.nbf {
            claims.insert("nbf".to_string(), json!(nbf));
        }
        if let Some(permissions) = self.permissions {
            claims.insert("permissions".to_string(), permissions);
        }
        Value::Object(claims)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_claims() {
        let claims = TestTokenBuilder::new().build();
        assert_eq!(claims["iss"], "https://latte-test.auth0.com/");
        assert_eq!(claims["aud"], "latte");
        assert_eq!(claims["permissions"], json!([]));
        assert!(claims["exp"].as_i64().unwrap() > Utc::now().timestamp());
        assert!(claims.get("nbf").is_none());
    }

    #[test]
    fn test_without_permissions_omits_claim() {
        let claims = TestTokenBuilder::new().without_permissions().build();
        assert!(claims.get("permissions").is_none());
    }

    #[test]
    fn test_expired_token() {
        let claims = TestTokenBuilder::new().expires_in(-60).build();
        assert!(claims["exp"].as_i64().unwrap() < Utc::now().timestamp());
    }

    #[test]
    fn test_extra_claims_do_not_override_registered_ones() {
        let claims = TestTokenBuilder::new()
            .claim("iss", json!("https://evil.example/"))
            .claim("azp", json!("client-id"))
            .build();
        assert_eq!(claims["iss"], "https://latte-test.auth0.com/");
        assert_eq!(claims["azp"], "client-id");
    }
}
