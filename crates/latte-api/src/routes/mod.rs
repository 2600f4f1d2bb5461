//! HTTP routes for the latte API.
//!
//! Defines the Axum router and application state.

use crate::auth::{AccessRequirement, Authenticator};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{
    http_metrics_middleware, method_not_allowed_envelope, require_permission, PermissionGuard,
};
use crate::services::{LatteStore, ProjectStore};
use axum::{
    middleware,
    routing::{delete, get, patch, post, MethodRouter},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Latte persistence.
    pub lattes: Arc<dyn LatteStore>,

    /// Project persistence.
    pub projects: Arc<dyn ProjectStore>,

    /// Bearer-token authenticator shared by every protected route.
    pub authenticator: Arc<Authenticator>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/`, `/health` - Liveness endpoints - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/api/latte`, `/api/latte/:id` - Reads public, writes guarded per method
/// - `/api/latte-detail` - Requires `get:latte`
/// - `/api/project`, `/api/project/:id` - Reads public, writes guarded per method
/// - JSON 404 fallback and JSON 405 envelope
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let latte_audience = state.config.auth.latte_audience.clone();
    let project_audience = state.config.auth.project_audience.clone();
    let auth = state.authenticator.clone();

    let latte_routes = Router::new()
        .route(
            "/api/latte",
            get(handlers::list_lattes).merge(guarded(
                post(handlers::create_latte),
                &auth,
                "post:latte",
                &latte_audience,
            )),
        )
        .route(
            "/api/latte/:id",
            get(handlers::get_latte)
                .merge(guarded(
                    patch(handlers::update_latte),
                    &auth,
                    "patch:latte",
                    &latte_audience,
                ))
                .merge(guarded(
                    delete(handlers::delete_latte),
                    &auth,
                    "delete:latte",
                    &latte_audience,
                )),
        )
        .route(
            "/api/latte-detail",
            guarded(
                get(handlers::list_latte_details),
                &auth,
                "get:latte",
                &latte_audience,
            ),
        );

    let project_routes = Router::new()
        .route(
            "/api/project",
            get(handlers::list_projects).merge(guarded(
                post(handlers::create_project),
                &auth,
                "post:project",
                &project_audience,
            )),
        )
        .route(
            "/api/project/:id",
            get(handlers::get_project)
                .merge(guarded(
                    patch(handlers::update_project),
                    &auth,
                    "patch:project",
                    &project_audience,
                ))
                .merge(guarded(
                    delete(handlers::delete_project),
                    &auth,
                    "delete:project",
                    &project_audience,
                )),
        );

    let app_routes = Router::new()
        .route("/", get(handlers::root_status))
        .route("/health", get(handlers::health_check))
        .merge(latte_routes)
        .merge(project_routes)
        .fallback(handlers::not_found)
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. method_not_allowed_envelope - JSON body for router 405s (innermost)
    // 2. TraceLayer - Log request details
    // 3. TimeoutLayer - Timeout the request
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    app_routes
        .merge(metrics_routes)
        .layer(middleware::from_fn(method_not_allowed_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// Put `route` behind a permission check for `permission` on `audience`.
fn guarded(
    route: MethodRouter<Arc<AppState>>,
    authenticator: &Arc<Authenticator>,
    permission: &str,
    audience: &str,
) -> MethodRouter<Arc<AppState>> {
    route.route_layer(middleware::from_fn_with_state(
        PermissionGuard::new(
            Arc::clone(authenticator),
            AccessRequirement::new(permission, audience),
        ),
        require_permission,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::services::{InMemoryLatteStore, InMemoryProjectStore};
    use axum::{
        body::Body,
        http::{header::ALLOW, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://localhost/latte".to_string(),
            ),
            ("AUTH0_DOMAIN".to_string(), "example.auth0.com".to_string()),
            (
                "JWKS_URL".to_string(),
                "http://127.0.0.1:9/.well-known/jwks.json".to_string(),
            ),
        ]);
        let config = Config::from_vars(&vars).unwrap();
        let authenticator = Arc::new(Authenticator::new(&config.auth).unwrap());
        let state = Arc::new(AppState {
            config,
            lattes: Arc::new(InMemoryLatteStore::new()),
            projects: Arc::new(InMemoryProjectStore::new()),
            authenticator,
        });
        let handle = PrometheusBuilder::new().build_recorder().handle();
        build_routes(state, handle)
    }

    async fn send(method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_public_list_needs_no_token() {
        let (status, body) = send("GET", "/api/latte").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["lattes"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_protected_method_requires_token() {
        let (status, body) = send("DELETE", "/api/latte/1").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Missing mandatory headers.");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, body) = send("GET", "/api/espresso").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 404);
    }

    #[tokio::test]
    async fn test_unsupported_method_is_json_405() {
        let request = Request::builder()
            .method("PUT")
            .uri("/api/latte-detail")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key(ALLOW));
    }

    #[tokio::test]
    async fn test_non_integer_id_is_404() {
        let (status, _) = send("GET", "/api/project/abc").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
