//! Permission middleware for protected routes.
//!
//! Each protected method carries its own [`PermissionGuard`]. The guard
//! authorizes the request before the handler runs, so request bodies are
//! never parsed for unauthorized callers. Verified claims are injected into
//! request extensions for the handler.

use crate::auth::{AccessRequirement, Authenticator};
use crate::errors::ApiError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// State for one protected route method.
#[derive(Clone)]
pub struct PermissionGuard {
    pub authenticator: Arc<Authenticator>,
    pub requirement: AccessRequirement,
}

impl PermissionGuard {
    pub fn new(authenticator: Arc<Authenticator>, requirement: AccessRequirement) -> Self {
        Self {
            authenticator,
            requirement,
        }
    }
}

/// Authorize the request against the guard's requirement.
///
/// # Response
///
/// - 400/401 JSON envelope with the authorization failure's description
/// - Otherwise the handler's response, with the [`ClaimSet`](crate::auth::ClaimSet)
///   available through `Extension<ClaimSet>`
#[instrument(
    skip_all,
    name = "latte.middleware.require_permission",
    fields(permission = %guard.requirement.permission)
)]
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = req.headers().clone();

    let response = guard
        .authenticator
        .guard(&headers, &guard.requirement, |claims| async move {
            req.extensions_mut().insert(claims);
            next.run(req).await
        })
        .await?;

    Ok(response)
}
