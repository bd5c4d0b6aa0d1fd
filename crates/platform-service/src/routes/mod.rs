//! HTTP routes for the Game Platform.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::crypto::{KeyManager, DEFAULT_BCRYPT_COST};
use crate::errors::PlatformError;
use crate::handlers;
use crate::services::{SessionStore, TokenIssuer, UserStore};
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

    /// Process-lifetime signing key.
    pub key_manager: Arc<KeyManager>,

    /// Live player sessions.
    pub sessions: Arc<SessionStore>,

    /// Player credentials.
    pub users: Arc<UserStore>,

    /// Token minting bound to `key_manager`.
    pub token_issuer: TokenIssuer,
}

impl AppState {
    /// Build state from configuration, generating a fresh signing key.
    pub fn new(config: Config) -> Result<Self, PlatformError> {
        let key_manager = Arc::new(KeyManager::generate()?);
        let users = match &config.users {
            Some(users) => UserStore::new(users.clone())?,
            None => UserStore::development(DEFAULT_BCRYPT_COST)?,
        };
        Ok(Self::with_components(config, key_manager, users))
    }

    /// Build state around an existing key and user table.
    pub fn with_components(config: Config, key_manager: Arc<KeyManager>, users: UserStore) -> Self {
        let sessions = Arc::new(SessionStore::with_default_ttl(chrono::Duration::seconds(
            config.session_ttl_seconds,
        )));
        let token_issuer =
            TokenIssuer::new(Arc::clone(&key_manager), &config.issuer, &config.audience);

        Self {
            config,
            key_manager,
            sessions,
            users: Arc::new(users),
            token_issuer,
        }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/.well-known/jwks.json` - Public signing key
/// - `/player/login` - Password login, sets the session cookie
/// - `/player/logout` - Ends the session named by the cookie
/// - `/issue` - Mint a game access token for the session's player
/// - `/health` - Liveness probe
/// - `/metrics` - Prometheus metrics endpoint
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let app_routes = Router::new()
        .route("/.well-known/jwks.json", get(handlers::handle_get_jwks))
        .route("/player/login", post(handlers::handle_login))
        .route("/player/logout", post(handlers::handle_logout))
        .route("/issue", post(handlers::handle_issue_token))
        .route("/health", get(handlers::health_check))
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
