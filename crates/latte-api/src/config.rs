//! Latte API configuration.
//!
//! Configuration is loaded from environment variables. The database URL is
//! redacted in Debug output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default audience for latte endpoints.
pub const DEFAULT_LATTE_AUDIENCE: &str = "latte";

/// Default audience for project endpoints.
pub const DEFAULT_PROJECT_AUDIENCE: &str = "project";

/// Default JWKS fetch timeout in seconds.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Maximum accepted JWT leeway in seconds.
pub const MAX_JWT_LEEWAY_SECONDS: u64 = 600;

/// Maximum JWKS cache TTL in seconds (one day).
pub const MAX_JWKS_CACHE_TTL_SECONDS: u64 = 86_400;

/// Identity-provider settings handed to the authenticator at construction.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Identity-provider domain without scheme, e.g. `tenant.auth0.com`.
    pub domain: String,

    /// JWKS endpoint (default: `https://<domain>/.well-known/jwks.json`).
    pub jwks_url: String,

    pub latte_audience: String,

    pub project_audience: String,

    /// Zero disables key-set caching.
    pub jwks_cache_ttl: Duration,

    pub jwks_fetch_timeout: Duration,

    /// Clock skew tolerance for `exp` and `nbf`.
    pub leeway_seconds: u64,
}

impl AuthConfig {
    /// Required `iss` claim value.
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.domain)
    }
}

/// Latte API configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    pub auth: AuthConfig,

    /// Seconds to wait after a shutdown signal before stopping (default: 0).
    pub drain_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("auth", &self.auth)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid auth domain: {0}")]
    InvalidAuthDomain(String),

    #[error("Invalid JWKS configuration: {0}")]
    InvalidJwks(String),

    #[error("Invalid JWT leeway configuration: {0}")]
    InvalidJwtLeeway(String),

    #[error("Invalid drain configuration: {0}")]
    InvalidDrain(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let domain = vars
            .get("AUTH0_DOMAIN")
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH0_DOMAIN".to_string()))?
            .trim()
            .to_string();

        if domain.is_empty() || domain.contains("://") || domain.contains('/') {
            return Err(ConfigError::InvalidAuthDomain(format!(
                "AUTH0_DOMAIN must be a bare host name, got '{}'",
                domain
            )));
        }

        let jwks_url = vars
            .get("JWKS_URL")
            .cloned()
            .unwrap_or_else(|| format!("https://{}/.well-known/jwks.json", domain));

        let latte_audience = vars
            .get("LATTE_AUDIENCE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LATTE_AUDIENCE.to_string());

        let project_audience = vars
            .get("PROJECT_AUDIENCE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_PROJECT_AUDIENCE.to_string());

        let cache_ttl_seconds = parse_u64(vars, "JWKS_CACHE_TTL_SECONDS", 0)
            .map_err(ConfigError::InvalidJwks)?;

        if cache_ttl_seconds > MAX_JWKS_CACHE_TTL_SECONDS {
            return Err(ConfigError::InvalidJwks(format!(
                "JWKS_CACHE_TTL_SECONDS must not exceed {} seconds, got {}",
                MAX_JWKS_CACHE_TTL_SECONDS, cache_ttl_seconds
            )));
        }

        let fetch_timeout_seconds = parse_u64(
            vars,
            "JWKS_FETCH_TIMEOUT_SECONDS",
            DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS,
        )
        .map_err(ConfigError::InvalidJwks)?;

        if fetch_timeout_seconds == 0 {
            return Err(ConfigError::InvalidJwks(
                "JWKS_FETCH_TIMEOUT_SECONDS must be greater than 0".to_string(),
            ));
        }

        let leeway_seconds =
            parse_u64(vars, "JWT_LEEWAY_SECONDS", 0).map_err(ConfigError::InvalidJwtLeeway)?;

        if leeway_seconds > MAX_JWT_LEEWAY_SECONDS {
            return Err(ConfigError::InvalidJwtLeeway(format!(
                "JWT_LEEWAY_SECONDS must not exceed {} seconds, got {}",
                MAX_JWT_LEEWAY_SECONDS, leeway_seconds
            )));
        }

        let drain_seconds =
            parse_u64(vars, "DRAIN_SECONDS", 0).map_err(ConfigError::InvalidDrain)?;

        Ok(Config {
            database_url,
            bind_address,
            auth: AuthConfig {
                domain,
                jwks_url,
                latte_audience,
                project_audience,
                jwks_cache_ttl: Duration::from_secs(cache_ttl_seconds),
                jwks_fetch_timeout: Duration::from_secs(fetch_timeout_seconds),
                leeway_seconds,
            },
            drain_seconds,
        })
    }
}

fn parse_u64(vars: &HashMap<String, String>, name: &str, default: u64) -> Result<u64, String> {
    match vars.get(name) {
        Some(value_str) => value_str.parse().map_err(|e| {
            format!(
                "{} must be a valid non-negative integer, got '{}': {}",
                name, value_str, e
            )
        }),
        None => Ok(default),
    }
}
