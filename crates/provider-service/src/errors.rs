use crate::auth::ValidationError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Missing or malformed bearer token")]
    MissingToken,

    #[error("{0}")]
    Rejected(ValidationError),
}

impl From<ValidationError> for ProviderError {
    fn from(error: ValidationError) -> Self {
        ProviderError::Rejected(error)
    }
}

impl ProviderError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ProviderError::MissingToken => "missing_token",
            ProviderError::Rejected(error) => error.as_str(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProviderError::MissingToken => StatusCode::UNAUTHORIZED,
            ProviderError::Rejected(error) => match error {
                ValidationError::UnknownIssuer
                | ValidationError::InvalidToken
                | ValidationError::ExpiredToken
                | ValidationError::InvalidAudience => StatusCode::UNAUTHORIZED,
                ValidationError::GameRequestMismatch
                | ValidationError::GameNotAllowedForPlatform => StatusCode::FORBIDDEN,
                ValidationError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for ProviderError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
        };

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}
