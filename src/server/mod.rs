//! HTTP API
//!
//! Axum router wrapped in the security middleware stack, served until Ctrl+C
//! or SIGTERM.

pub mod middleware;
pub mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal, task::JoinHandle};
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

pub use state::AppState;

use crate::config::Config;

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Build the application router
///
/// Layers run outermost first: CORS, monitoring, security headers, connection
/// tracking, input validation, injection inspection, general rate limit.
pub fn router(state: Arc<AppState>) -> Router {
    let max_body_size = state.config.security.max_body_size;

    Router::new()
        .route("/", get(routes::root))
        .route("/api/health", get(routes::health))
        .route("/api/data/{data_type}", get(routes::get_data))
        .route("/api/export/data", post(routes::export_data))
        .route("/api/backup/create", post(routes::create_backup))
        .route("/api/backup/list", get(routes::list_backups))
        .route("/api/settings", get(routes::get_settings))
        .route(
            "/api/settings/backup",
            get(routes::get_backup_settings).put(routes::update_backup_settings),
        )
        .route("/api/security/events", get(routes::security_events))
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(from_fn_with_state(state.clone(), middleware::general_rate_limit))
        .layer(from_fn_with_state(state.clone(), middleware::inspect_input))
        .layer(from_fn_with_state(state.clone(), middleware::validate_input))
        .layer(from_fn_with_state(state.clone(), middleware::track_connections))
        .layer(from_fn_with_state(state.clone(), middleware::security_headers))
        .layer(from_fn_with_state(state.clone(), middleware::monitor))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Open the store, bind and serve until a shutdown signal arrives
pub async fn serve(config: Config) -> Result<()> {
    let address = config.address();

    info!("Initializing state...");
    let state = AppState::open(config)?;
    let pruner = spawn_pruner(state.clone());

    let app = router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind: {address}"))?;
    info!("Server running on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    pruner.abort();
    info!("Server shut down");
    Ok(())
}

/// Drop expired rate-limit windows and connection records every minute
fn spawn_pruner(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let (rate_keys, connection_ips) = state.security.prune();
            debug!(
                rate_keys,
                connection_ips,
                tracked_rate_keys = state.security.limiter.tracked_keys(),
                "Pruned security state"
            );
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
