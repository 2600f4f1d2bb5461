//! Decoded claim set and permission checking.
//!
//! The `sub` field is redacted in Debug output to prevent exposure in logs.

use crate::auth::error::AuthError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Audience claim, which identity providers emit as a string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Multiple(auds) => auds.iter().any(|a| a == audience),
        }
    }
}

/// The `permissions` claim exactly as the token carried it.
///
/// Identity providers emit a list of strings, but the claim is not validated
/// beyond being present, so other JSON shapes are retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Permissions {
    List(Vec<Value>),
    Text(String),
    Object(Map<String, Value>),
    Other(Value),
}

impl Permissions {
    /// Containment check.
    ///
    /// Lists match on element equality and objects on key membership. A bare
    /// string matches any substring, so `"post:latte"` contains `"post:lat"`.
    pub fn contains(&self, permission: &str) -> bool {
        match self {
            Permissions::List(items) => items.iter().any(|v| v.as_str() == Some(permission)),
            Permissions::Text(text) => text.contains(permission),
            Permissions::Object(map) => map.contains_key(permission),
            Permissions::Other(_) => false,
        }
    }
}

/// Claims of a verified token.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Issuer, `https://<auth-domain>/`.
    pub iss: String,

    /// Subject - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    pub aud: Audience,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// A JSON `null` is treated the same as an absent claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,

    /// Every other claim, retained verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for ClaimSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimSet")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("aud", &self.aud)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

impl ClaimSet {
    /// Whether the token carries `permission`.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|p| p.contains(permission))
    }

    /// String entries of a list-shaped `permissions` claim, in token order.
    pub fn permission_list(&self) -> Vec<&str> {
        match &self.permissions {
            Some(Permissions::List(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Expiry as a timestamp, if it is representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Check that `claims` grants `required`.
///
/// Fails with [`AuthError::MissingPermissions`] when there is no
/// `permissions` claim and [`AuthError::PermissionDenied`] when the required
/// string is not contained in it.
pub fn check_permission(required: &str, claims: &ClaimSet) -> Result<(), AuthError> {
    let permissions = claims.permissions.as_ref().ok_or_else(|| {
        tracing::debug!(target: "latte.auth.claims", "Token has no permissions claim");
        AuthError::MissingPermissions
    })?;

    if !permissions.contains(required) {
        tracing::debug!(
            target: "latte.auth.claims",
            permission = %required,
            "Token lacks required permission"
        );
        return Err(AuthError::PermissionDenied);
    }

    Ok(())
}
