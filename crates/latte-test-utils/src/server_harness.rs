//! Test server harness for E2E testing
//!
//! Provides `TestApiServer` for spawning real latte API instances in tests.
//! Storage is in memory; the identity provider is whatever JWKS URL the
//! test hands in, normally a [`MockJwks`](crate::jwks_server::MockJwks).

use crate::token_builders::TEST_AUTH_DOMAIN;
use latte_api::auth::Authenticator;
use latte_api::config::Config;
use latte_api::routes::{self, init_metrics_recorder, AppState};
use latte_api::services::{InMemoryLatteStore, InMemoryProjectStore, LatteStore, ProjectStore};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Global metrics handle shared by every test server in the process.
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the latte API in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_list_lattes() -> Result<()> {
///     let jwks = MockJwks::serving(&[&TestKeypair::primary()]).await;
///     let server = TestApiServer::spawn(&jwks.url()).await?;
///
///     let response = reqwest::get(format!("{}/api/latte", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestApiServer {
    addr: SocketAddr,
    config: Config,
    lattes: Arc<InMemoryLatteStore>,
    projects: Arc<InMemoryProjectStore>,
    _handle: JoinHandle<()>,
}

impl TestApiServer {
    /// Spawn a server with empty stores.
    pub async fn spawn(jwks_url: &str) -> Result<Self, anyhow::Error> {
        Self::spawn_with(jwks_url, InMemoryLatteStore::new(), &[]).await
    }

    /// Spawn a server with the given latte store and extra environment
    /// variables layered over the test defaults.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Verify tokens issued by `https://latte-test.auth0.com/`
    /// - Fetch keys from `jwks_url`
    pub async fn spawn_with(
        jwks_url: &str,
        lattes: InMemoryLatteStore,
        extra_vars: &[(&str, &str)],
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("AUTH0_DOMAIN".to_string(), TEST_AUTH_DOMAIN.to_string()),
            ("JWKS_URL".to_string(), jwks_url.to_string()),
        ]);
        for (name, value) in extra_vars {
            vars.insert((*name).to_string(), (*value).to_string());
        }

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let lattes = Arc::new(lattes);
        let projects = Arc::new(InMemoryProjectStore::new());
        let latte_store: Arc<dyn LatteStore> = lattes.clone();
        let project_store: Arc<dyn ProjectStore> = projects.clone();

        let state = Arc::new(AppState {
            config: config.clone(),
            lattes: latte_store,
            projects: project_store,
            authenticator: Arc::new(Authenticator::new(&config.auth)?),
        });

        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            lattes,
            projects,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The latte store behind the server, for asserting on side effects.
    pub fn lattes(&self) -> &InMemoryLatteStore {
        &self.lattes
    }

    /// The project store behind the server.
    pub fn projects(&self) -> &InMemoryProjectStore {
        &self.projects
    }
}

impl Drop for TestApiServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
