use crate::errors::PlatformError;
use crate::handlers::auth_handler::session_id_from_headers;
use crate::routes::AppState;
use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    #[serde(rename = "gameId", default)]
    pub game_id: Option<String>,
}

#[derive(Serialize)]
pub struct IssueTokenResponse {
    pub token: String,
}

/// Handle game token request
///
/// POST /issue
///
/// The caller must hold a live session cookie; looking it up also extends
/// the session.
#[instrument(name = "platform.token.issue", skip_all)]
pub async fn handle_issue_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<IssueTokenRequest>>,
) -> Result<Json<IssueTokenResponse>, PlatformError> {
    let session = session_id_from_headers(&headers)
        .and_then(|session_id| state.sessions.get(&session_id, true))
        .ok_or(PlatformError::NotAuthenticated)?;

    let game_id = payload
        .and_then(|Json(request)| request.game_id)
        .filter(|game_id| !game_id.is_empty())
        .ok_or(PlatformError::MissingGameId)?;

    let token = state.token_issuer.issue(&session.identity, &game_id)?;

    Ok(Json(IssueTokenResponse { token }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_request_uses_camel_case_game_id() {
        let request: IssueTokenRequest =
            serde_json::from_str(r#"{"gameId":"game-slots"}"#).unwrap();
        assert_eq!(request.game_id.as_deref(), Some("game-slots"));

        let request: IssueTokenRequest = serde_json::from_str(r#"{"game_id":"x"}"#).unwrap();
        assert!(request.game_id.is_none());
    }
}
