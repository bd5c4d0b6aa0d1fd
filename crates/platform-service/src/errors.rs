use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Missing session")]
    MissingSession,

    #[error("Missing gameId")]
    MissingGameId,

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Internal server error")]
    Internal,
}

impl PlatformError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            PlatformError::MissingCredentials => "missing_credentials",
            PlatformError::InvalidCredentials => "invalid_credentials",
            PlatformError::NotAuthenticated => "not_authenticated",
            PlatformError::MissingSession => "missing_session",
            PlatformError::MissingGameId => "missing_gameId",
            PlatformError::Crypto(_) | PlatformError::Internal => "internal_error",
            PlatformError::Signing(_) => "signing_failed",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PlatformError::MissingCredentials
            | PlatformError::MissingSession
            | PlatformError::MissingGameId => StatusCode::BAD_REQUEST,
            PlatformError::InvalidCredentials | PlatformError::NotAuthenticated => {
                StatusCode::UNAUTHORIZED
            }
            PlatformError::Crypto(_) | PlatformError::Signing(_) | PlatformError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal details stay in the logs, never in the body.
        let message = match &self {
            PlatformError::Crypto(_) | PlatformError::Internal => {
                "An internal error occurred".to_string()
            }
            PlatformError::Signing(_) => "Token signing failed".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: self.code(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_credentials_response() {
        let response = PlatformError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"], "missing_credentials");
        assert_eq!(json["message"], "Missing credentials");
    }

    #[tokio::test]
    async fn test_invalid_credentials_response() {
        let response = PlatformError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "invalid_credentials");
    }

    #[tokio::test]
    async fn test_not_authenticated_response() {
        let response = PlatformError::NotAuthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "not_authenticated");
    }

    #[tokio::test]
    async fn test_missing_game_id_response() {
        let response = PlatformError::MissingGameId.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "missing_gameId");
    }

    #[tokio::test]
    async fn test_signing_failure_hides_details() {
        let response = PlatformError::Signing("rsa blinding failed".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "signing_failed");
        assert!(!json["message"].as_str().unwrap().contains("blinding"));
    }

    #[tokio::test]
    async fn test_crypto_failure_hides_details() {
        let response = PlatformError::Crypto("bad modulus".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "internal_error");
        assert_eq!(json["message"], "An internal error occurred");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            PlatformError::Crypto("x".to_string()).to_string(),
            "Cryptographic error: x"
        );
        assert_eq!(PlatformError::MissingSession.to_string(), "Missing session");
    }
}
