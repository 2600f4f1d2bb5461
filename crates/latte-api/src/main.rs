//! Latte API
//!
//! Entry point for the latte and project REST service.

use latte_api::auth::Authenticator;
use latte_api::config::Config;
use latte_api::routes::{self, AppState};
use latte_api::services::{PgLatteStore, PgProjectStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // LOG_FORMAT=json switches to structured JSON output
    let json_logs = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "latte_api=debug,tower_http=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    info!("Starting latte API");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        auth_domain = %config.auth.domain,
        jwks_url = %config.auth.jwks_url,
        jwks_cache_ttl_seconds = config.auth.jwks_cache_ttl.as_secs(),
        leeway_seconds = config.auth.leeway_seconds,
        "Configuration loaded successfully"
    );

    let metrics_handle = routes::init_metrics_recorder().map_err(|e| {
        error!("Failed to install metrics recorder: {}", e);
        anyhow::anyhow!(e)
    })?;

    info!("Connecting to database...");
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| {
            error!("Failed to apply migrations: {}", e);
            e
        })?;

    info!("Database connection established");

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;
    let drain_seconds = config.drain_seconds;

    let authenticator = Arc::new(Authenticator::new(&config.auth)?);
    let state = Arc::new(AppState {
        config,
        lattes: Arc::new(PgLatteStore::new(db_pool.clone())),
        projects: Arc::new(PgProjectStore::new(db_pool)),
        authenticator,
    });

    let app = routes::build_routes(state, metrics_handle);

    info!("Latte API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(drain_seconds))
        .await?;

    info!("Latte API shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and the drain period is complete.
async fn shutdown_signal(drain_seconds: u64) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    if drain_seconds > 0 {
        warn!("Draining connections for {} seconds...", drain_seconds);
        tokio::time::sleep(Duration::from_secs(drain_seconds)).await;
        info!("Drain period complete");
    }
}
