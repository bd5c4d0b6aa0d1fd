use crate::observability::metrics::record_jwks_request;
use crate::routes::AppState;
use axum::{
    extract::State,
    http::header::{HeaderMap, HeaderValue, CACHE_CONTROL},
    Json,
};
use common::jwk::JwkSet;
use std::sync::Arc;
use tracing::instrument;

/// Handle JWKS request
///
/// GET /.well-known/jwks.json
///
/// Returns the platform's public signing key in JWKS format (RFC 7517)
/// with Cache-Control header set to max-age=300, matching the provider's
/// cache TTL.
#[instrument(name = "platform.jwks.get", skip_all)]
pub async fn handle_get_jwks(State(state): State<Arc<AppState>>) -> (HeaderMap, Json<JwkSet>) {
    record_jwks_request();

    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=300"));

    (headers, Json(state.key_manager.public_key_set().clone()))
}
