//! Game Platform
//!
//! Entry point for the player-facing platform: login, sessions and game
//! token issuance.

use platform_service::config::Config;
use platform_service::observability::metrics::init_metrics_recorder;
use platform_service::routes::{self, AppState};
use platform_service::tasks::session_sweeper::{
    start_session_sweeper, DEFAULT_SWEEP_INTERVAL_SECONDS,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "platform_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Game Platform");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        issuer = %config.issuer,
        audience = %config.audience,
        session_ttl_seconds = config.session_ttl_seconds,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let bind_address = config.bind_address.clone();

    // Key generation failure is fatal at startup
    let state = Arc::new(AppState::new(config).map_err(|e| {
        error!("Failed to initialize application state: {}", e);
        e
    })?);

    info!(kid = %state.key_manager.kid(), "Signing key ready");

    let cancel_token = CancellationToken::new();
    let sweeper = tokio::spawn(start_session_sweeper(
        Arc::clone(&state.sessions),
        Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECONDS),
        cancel_token.clone(),
    ));

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Game Platform listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel_token.cancel();
    if let Err(e) = sweeper.await {
        error!("Session sweeper task failed: {}", e);
    }

    info!("Game Platform shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
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
}
