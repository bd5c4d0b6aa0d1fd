//! Token validation for the Game Provider.
//!
//! - [`jwks`]: per-URL cache of platform key sets
//! - [`verifier`]: RS256 signature check against a platform's keys
//! - [`validator`]: the ordered validation chain producing a verdict

pub mod jwks;
pub mod validator;
pub mod verifier;

pub use jwks::{JwksCache, JwksError};
pub use validator::TokenValidator;
pub use verifier::{SignatureVerifier, VerificationError};

use common::jwt::GameClaims;
use thiserror::Error;

/// Why a token was rejected. Exactly one per rejected token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Token issuer is not a registered platform")]
    UnknownIssuer,

    #[error("The access token is invalid")]
    InvalidToken,

    #[error("The access token has expired")]
    ExpiredToken,

    #[error("The access token is not intended for this provider")]
    InvalidAudience,

    #[error("The access token was issued for a different game")]
    GameRequestMismatch,

    #[error("The issuing platform is not allowed to grant this game")]
    GameNotAllowedForPlatform,

    #[error("An internal error occurred")]
    InternalError,
}

impl ValidationError {
    /// Stable error code used in responses, logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationError::UnknownIssuer => "unknown_issuer",
            ValidationError::InvalidToken => "invalid_token",
            ValidationError::ExpiredToken => "expired_token",
            ValidationError::InvalidAudience => "invalid_audience",
            ValidationError::GameRequestMismatch => "game_request_mismatch",
            ValidationError::GameNotAllowedForPlatform => "game_not_allowed_for_platform",
            ValidationError::InternalError => "internal_error",
        }
    }
}

/// Outcome of validating one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationVerdict {
    Accepted(GameClaims),
    Rejected(ValidationError),
}

impl ValidationVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationVerdict::Accepted(_))
    }

    /// Verified claims, if accepted.
    pub fn claims(&self) -> Option<&GameClaims> {
        match self {
            ValidationVerdict::Accepted(claims) => Some(claims),
            ValidationVerdict::Rejected(_) => None,
        }
    }

    /// Rejection reason, if rejected.
    pub fn error(&self) -> Option<ValidationError> {
        match self {
            ValidationVerdict::Accepted(_) => None,
            ValidationVerdict::Rejected(error) => Some(*error),
        }
    }

    pub fn into_result(self) -> Result<GameClaims, ValidationError> {
        match self {
            ValidationVerdict::Accepted(claims) => Ok(claims),
            ValidationVerdict::Rejected(error) => Err(error),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let cases = [
            (ValidationError::UnknownIssuer, "unknown_issuer"),
            (ValidationError::InvalidToken, "invalid_token"),
            (ValidationError::ExpiredToken, "expired_token"),
            (ValidationError::InvalidAudience, "invalid_audience"),
            (ValidationError::GameRequestMismatch, "game_request_mismatch"),
            (
                ValidationError::GameNotAllowedForPlatform,
                "game_not_allowed_for_platform",
            ),
            (ValidationError::InternalError, "internal_error"),
        ];
        for (error, code) in cases {
            assert_eq!(error.as_str(), code);
        }
    }

    #[test]
    fn test_verdict_has_exactly_one_arm() {
        let claims = GameClaims::new("p", "s", "a", "g", "j", 0, 1);
        let accepted = ValidationVerdict::Accepted(claims.clone());
        assert!(accepted.is_accepted());
        assert_eq!(accepted.claims(), Some(&claims));
        assert_eq!(accepted.error(), None);
        assert_eq!(accepted.into_result().unwrap(), claims);

        let rejected = ValidationVerdict::Rejected(ValidationError::ExpiredToken);
        assert!(!rejected.is_accepted());
        assert!(rejected.claims().is_none());
        assert_eq!(rejected.error(), Some(ValidationError::ExpiredToken));
        assert_eq!(
            rejected.into_result().unwrap_err(),
            ValidationError::ExpiredToken
        );
    }
}
