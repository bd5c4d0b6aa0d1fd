//! Game Provider
//!
//! Entry point for the provider: validates platform-issued game tokens on
//! game launch.

use provider_service::config::Config;
use provider_service::observability::metrics::init_metrics_recorder;
use provider_service::routes::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "provider_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Game Provider");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        audience = %config.audience,
        jwks_cache_ttl_seconds = config.jwks_cache_ttl_seconds,
        platform_count = config.platforms.len(),
        "Configuration loaded successfully"
    );

    for platform in &config.platforms {
        info!(
            platform_id = %platform.platform_id,
            jwks_url = %platform.jwks_url,
            game_count = platform.registered_games.len(),
            "Trusted platform registered"
        );
    }

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState::new(config));
    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Game Provider listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Game Provider shutdown complete");

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
