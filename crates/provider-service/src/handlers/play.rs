use crate::errors::ProviderError;
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

const BEARER_PREFIX: &str = "bearer ";

#[derive(Debug, Serialize)]
pub struct PlayResponse {
    pub status: &'static str,
    #[serde(rename = "gameId")]
    pub game_id: String,
}

/// Handle a game launch
///
/// POST /:game_id/play
///
/// Requires `Authorization: Bearer <token>` where the token was issued for
/// exactly this game.
#[instrument(name = "provider.play", skip_all, fields(game_id = %game_id))]
pub async fn handle_play(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PlayResponse>, ProviderError> {
    let token = bearer_token(&headers).ok_or(ProviderError::MissingToken)?;

    state
        .validator
        .validate(token, &game_id)
        .await
        .into_result()?;

    tracing::info!(target: "provider.play", "Game access granted");

    Ok(Json(PlayResponse {
        status: "ok",
        game_id,
    }))
}

/// Token from an `Authorization` header with a case-insensitive `Bearer`
/// scheme, trimmed. `None` when absent, another scheme, or empty.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let scheme = value.get(..BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }

    let token = value.get(BEARER_PREFIX.len()..)?.trim();
    (!token.is_empty()).then_some(token)
}
