//! JWKS client for fetching the identity provider's signing keys.
//!
//! The key set is fetched from `https://<auth-domain>/.well-known/jwks.json`.
//! With a zero TTL (the default) every verification fetches a fresh set. A
//! positive TTL caches the set for at most that long, so a key rotation is
//! visible within one TTL, and a cached set that misses a `kid` is refetched
//! once before the lookup fails.

use crate::observability::metrics;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

/// Default fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" for RS256 keys).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    #[serde(default)]
    pub kid: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    #[serde(default)]
    pub alg: Option<String>,
}

/// JWKS document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Find the key whose `kid` matches. The first match wins.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}

/// A key set handed out by [`JwksClient::key_set`].
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: Arc<JwkSet>,
    cached: bool,
}

impl KeySet {
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.find(kid)
    }

    /// Whether this set was served from cache rather than fetched for this call.
    pub fn is_cached(&self) -> bool {
        self.cached
    }

    pub fn len(&self) -> usize {
        self.keys.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.keys.is_empty()
    }
}

/// Failure to obtain a usable key set.
#[derive(Debug, Error)]
pub enum JwksError {
    #[error("JWKS HTTP client could not be built: {0}")]
    Client(String),

    #[error("JWKS request failed: {0}")]
    Request(String),

    #[error("JWKS endpoint returned status {0}")]
    Status(u16),

    #[error("JWKS document could not be parsed: {0}")]
    Parse(String),
}

struct CachedJwks {
    keys: Arc<JwkSet>,
    expires_at: Instant,
}

/// JWKS client for fetching (and optionally caching) public keys.
pub struct JwksClient {
    jwks_url: String,
    http_client: reqwest::Client,
    cache: Arc<RwLock<Option<CachedJwks>>>,
    cache_ttl: Duration,
}

impl JwksClient {
    /// Create a client that fetches on every call.
    pub fn new(jwks_url: String) -> Result<Self, JwksError> {
        Self::with_options(
            jwks_url,
            Duration::ZERO,
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS),
        )
    }

    /// Create a client with a cache TTL and a fetch timeout.
    ///
    /// A zero `cache_ttl` disables caching. Fails if the HTTP client
    /// cannot be built with `fetch_timeout`.
    pub fn with_options(
        jwks_url: String,
        cache_ttl: Duration,
        fetch_timeout: Duration,
    ) -> Result<Self, JwksError> {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| {
                tracing::error!(target: "latte.auth.jwks", error = %e, "Failed to build JWKS HTTP client");
                JwksError::Client(e.to_string())
            })?;

        Ok(Self {
            jwks_url,
            http_client,
            cache: Arc::new(RwLock::new(None)),
            cache_ttl,
        })
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Get the current key set, fetching it unless a fresh cached copy exists.
    #[instrument(skip_all)]
    pub async fn key_set(&self) -> Result<KeySet, JwksError> {
        if !self.cache_ttl.is_zero() {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    tracing::debug!(target: "latte.auth.jwks", "JWKS cache hit");
                    return Ok(KeySet {
                        keys: Arc::clone(&cached.keys),
                        cached: true,
                    });
                }
            }
        }

        self.refresh().await
    }

    /// Fetch the key set from the network, replacing any cached copy.
    #[instrument(skip_all)]
    pub async fn refresh(&self) -> Result<KeySet, JwksError> {
        let start = Instant::now();
        let result = self.fetch().await;
        metrics::record_jwks_fetch(
            if result.is_ok() { "success" } else { "error" },
            start.elapsed(),
        );
        let keys = Arc::new(result?);

        tracing::debug!(
            target: "latte.auth.jwks",
            key_count = keys.keys.len(),
            "JWKS fetched"
        );

        if !self.cache_ttl.is_zero() {
            let mut cache = self.cache.write().await;
            *cache = Instant::now()
                .checked_add(self.cache_ttl)
                .map(|expires_at| CachedJwks {
                    keys: Arc::clone(&keys),
                    expires_at,
                });
        }

        Ok(KeySet {
            keys,
            cached: false,
        })
    }

    async fn fetch(&self) -> Result<JwkSet, JwksError> {
        tracing::debug!(target: "latte.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "latte.auth.jwks", error = %e, "Failed to fetch JWKS");
                JwksError::Request(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "latte.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(JwksError::Status(response.status().as_u16()));
        }

        response.json::<JwkSet>().await.map_err(|e| {
            tracing::error!(target: "latte.auth.jwks", error = %e, "Failed to parse JWKS response");
            JwksError::Parse(e.to_string())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JWKS_PATH: &str = "/.well-known/jwks.json";

    fn jwks_body() -> serde_json::Value {
        serde_json::json!({
            "keys": [
                {"kty": "RSA", "kid": "key-1", "use": "sig", "n": "AQAB", "e": "AQAB", "alg": "RS256"},
                {"kty": "RSA", "kid": "key-2", "use": "sig", "n": "AQAB", "e": "AQAB"}
            ]
        })
    }

    #[test]
    fn test_jwk_deserialization() {
        let json = r#"{
            "kty": "RSA",
            "kid": "test-key-01",
            "use": "sig",
            "n": "qlzKkvvc",
            "e": "AQAB",
            "alg": "RS256",
            "x5t": "ignored"
        }"#;

        let jwk: Jwk = serde_json::from_str(json).unwrap();

        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.kid.as_deref(), Some("test-key-01"));
        assert_eq!(jwk.key_use.as_deref(), Some("sig"));
        assert_eq!(jwk.n.as_deref(), Some("qlzKkvvc"));
        assert_eq!(jwk.e.as_deref(), Some("AQAB"));
        assert_eq!(jwk.alg.as_deref(), Some("RS256"));
    }

    #[test]
    fn test_jwk_deserialization_minimal() {
        let jwk: Jwk = serde_json::from_str(r#"{"kty": "RSA"}"#).unwrap();

        assert!(jwk.kid.is_none());
        assert!(jwk.n.is_none());
        assert!(jwk.e.is_none());
    }

    #[test]
    fn test_find_by_kid() {
        let set: JwkSet = serde_json::from_value(jwks_body()).unwrap();

        assert_eq!(set.find("key-2").and_then(|k| k.kid.as_deref()), Some("key-2"));
        assert!(set.find("key-3").is_none());
    }

    #[tokio::test]
    async fn test_ttl_zero_fetches_every_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
            .expect(2)
            .mount(&server)
            .await;

        let client = JwksClient::new(format!("{}{}", server.uri(), JWKS_PATH)).unwrap();

        let first = client.key_set().await.unwrap();
        let second = client.key_set().await.unwrap();

        assert!(!first.is_cached());
        assert!(!second.is_cached());
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn test_positive_ttl_serves_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = JwksClient::with_options(
            format!("{}{}", server.uri(), JWKS_PATH),
            Duration::from_secs(60),
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(!client.key_set().await.unwrap().is_cached());
        assert!(client.key_set().await.unwrap().is_cached());
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = JwksClient::new(format!("{}{}", server.uri(), JWKS_PATH)).unwrap();
        let err = client.key_set().await.unwrap_err();

        assert!(matches!(err, JwksError::Status(503)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = JwksClient::new(format!("{}{}", server.uri(), JWKS_PATH)).unwrap();
        let err = client.key_set().await.unwrap_err();

        assert!(matches!(err, JwksError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_client_options() {
        let client = JwksClient::with_options(
            "http://localhost:9/.well-known/jwks.json".to_string(),
            Duration::from_secs(30),
            Duration::from_secs(2),
        )
        .unwrap();
        assert_eq!(client.jwks_url(), "http://localhost:9/.well-known/jwks.json");
        assert_eq!(client.cache_ttl(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_slow_endpoint_hits_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(jwks_body())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = JwksClient::with_options(
            format!("{}{}", server.uri(), JWKS_PATH),
            Duration::ZERO,
            Duration::from_millis(200),
        )
        .unwrap();

        let start = Instant::now();
        let err = client.key_set().await.unwrap_err();

        assert!(matches!(err, JwksError::Request(_)), "got {err:?}");
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
