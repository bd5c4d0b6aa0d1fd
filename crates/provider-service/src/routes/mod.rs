//! HTTP routes for the Game Provider.
//!
//! Defines the Axum router and application state.

use crate::auth::{JwksCache, SignatureVerifier, TokenValidator};
use crate::config::Config;
use crate::handlers;
use crate::registry::{InMemoryPlatformRegistry, PlatformRegistry};
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Validation chain with its key-set cache.
    pub validator: Arc<TokenValidator>,
}

impl AppState {
    /// Build state from configuration with the in-memory registry.
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(InMemoryPlatformRegistry::new(config.platforms.clone()));
        Self::with_registry(config, registry)
    }

    /// Build state around a caller-supplied registry.
    pub fn with_registry(config: Config, registry: Arc<dyn PlatformRegistry>) -> Self {
        let jwks_cache = Arc::new(JwksCache::with_options(
            Duration::from_secs(config.jwks_cache_ttl_seconds),
            Duration::from_secs(config.jwks_fetch_timeout_seconds),
        ));
        let validator = TokenValidator::new(
            SignatureVerifier::new(jwks_cache),
            registry,
            &config.audience,
        );

        Self {
            config,
            validator: Arc::new(validator),
        }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/:game_id/play` - Launch a game with a bearer token
/// - `/health` - Liveness probe
/// - `/metrics` - Prometheus metrics endpoint
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let app_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/:game_id/play", post(handlers::handle_play))
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    app_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
