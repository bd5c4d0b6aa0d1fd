//! Player login and logout.
//!
//! A successful login creates a session and hands its id back in the
//! `PLATFORM_SESS` cookie; every other platform endpoint finds the session
//! through that cookie.

use crate::errors::PlatformError;
use crate::observability::metrics::record_login;
use crate::routes::AppState;
use axum::{
    extract::State,
    http::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE},
    Json,
};
use common::secret::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "PLATFORM_SESS";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub status: &'static str,
}

/// Handle player login
///
/// POST /player/login
///
/// A missing or unparseable body counts as missing credentials.
#[instrument(name = "platform.auth.login", skip_all, fields(status))]
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<(HeaderMap, Json<LoginResponse>), PlatformError> {
    let result = login(&state, payload).await;

    let status = if result.is_ok() { "success" } else { "error" };
    tracing::Span::current().record("status", status);
    record_login(status);

    result
}

async fn login(
    state: &AppState,
    payload: Option<Json<LoginRequest>>,
) -> Result<(HeaderMap, Json<LoginResponse>), PlatformError> {
    let Some(Json(request)) = payload else {
        return Err(PlatformError::MissingCredentials);
    };

    let (username, password) = match (request.username, request.password) {
        (Some(username), Some(password))
            if !username.is_empty() && !password.expose_secret().is_empty() =>
        {
            (username, password)
        }
        _ => return Err(PlatformError::MissingCredentials),
    };

    // bcrypt is deliberately slow; keep it off the async workers.
    let users = Arc::clone(&state.users);
    let candidate = username.clone();
    let verified = tokio::task::spawn_blocking(move || users.verify(&candidate, &password))
        .await
        .map_err(|e| {
            tracing::error!(target: "platform.auth", error = %e, "Password verification task failed");
            PlatformError::Internal
        })??;

    if !verified {
        tracing::debug!(target: "platform.auth", "Login rejected");
        return Err(PlatformError::InvalidCredentials);
    }

    let session = state.sessions.create(&username, None)?;
    let cookie = session_cookie(
        &session.session_id,
        session.ttl.num_seconds(),
        state.config.session_cookie_secure,
    )?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    tracing::info!(target: "platform.auth", "Player logged in");

    Ok((
        headers,
        Json(LoginResponse {
            status: "ok",
            username,
        }),
    ))
}

/// Handle player logout
///
/// POST /player/logout
#[instrument(name = "platform.auth.logout", skip_all)]
pub async fn handle_logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<LogoutResponse>), PlatformError> {
    let session_id = session_id_from_headers(&headers).ok_or(PlatformError::MissingSession)?;

    state.sessions.invalidate(&session_id);

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        SET_COOKIE,
        session_cookie("", 0, state.config.session_cookie_secure)?,
    );

    Ok((response_headers, Json(LogoutResponse { status: "ok" })))
}

/// Extract the session id from the request's `Cookie` headers.
pub(crate) fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE_NAME && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Build the `Set-Cookie` value for the session cookie.
///
/// `max_age_seconds == 0` tells the browser to drop the cookie.
pub(crate) fn session_cookie(
    session_id: &str,
    max_age_seconds: i64,
    secure: bool,
) -> Result<HeaderValue, PlatformError> {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        SESSION_COOKIE_NAME, session_id, max_age_seconds
    );
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie).map_err(|_| PlatformError::Internal)
}
