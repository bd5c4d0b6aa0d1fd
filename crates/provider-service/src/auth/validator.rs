//! The token validation chain.
//!
//! Parsing is the entry step; a token that does not parse is rejected as
//! `invalid_token` without touching the registry or the network. After that
//! the checks run in a fixed order and the first failure wins:
//!
//! 1. issuer resolves in the platform registry (`unknown_issuer`)
//! 2. signature verifies against the platform's keys (`invalid_token`, or
//!    `internal_error` when the keys cannot be fetched)
//! 3. `exp` present and in the future (`expired_token`)
//! 4. `aud` contains this provider (`invalid_audience`)
//! 5. `game` equals the requested game (`game_request_mismatch`)
//! 6. the platform may grant that game (`game_not_allowed_for_platform`)
//!
//! Nothing in the claims is trusted before step 2; the issuer is only used
//! to find which keys to verify with.

use crate::auth::verifier::SignatureVerifier;
use crate::auth::{ValidationError, ValidationVerdict};
use crate::observability::metrics::record_token_validation;
use crate::registry::PlatformRegistry;
use chrono::Utc;
use common::jwt::{decode_claims_unverified, decode_header_unverified, GameClaims};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

pub struct TokenValidator {
    verifier: SignatureVerifier,
    registry: Arc<dyn PlatformRegistry>,
    audience: String,
}

impl TokenValidator {
    pub fn new(
        verifier: SignatureVerifier,
        registry: Arc<dyn PlatformRegistry>,
        audience: &str,
    ) -> Self {
        Self {
            verifier,
            registry,
            audience: audience.to_string(),
        }
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Validate `token` for access to `required_game`.
    ///
    /// Never fails: every outcome, including key-fetch faults, is a verdict.
    #[instrument(skip_all, fields(game_id = %required_game))]
    pub async fn validate(&self, token: &str, required_game: &str) -> ValidationVerdict {
        let start = Instant::now();
        let verdict = self
            .validate_at(token, required_game, Utc::now().timestamp())
            .await;

        match &verdict {
            ValidationVerdict::Accepted(_) => {
                tracing::debug!(target: "provider.auth.validator", "Token accepted");
                record_token_validation("success", None, start.elapsed());
            }
            ValidationVerdict::Rejected(error) => {
                tracing::debug!(
                    target: "provider.auth.validator",
                    error_code = error.as_str(),
                    "Token rejected"
                );
                record_token_validation("error", Some(error.as_str()), start.elapsed());
            }
        }

        verdict
    }

    /// The validation chain evaluated at Unix time `now`.
    pub(crate) async fn validate_at(
        &self,
        token: &str,
        required_game: &str,
        now: i64,
    ) -> ValidationVerdict {
        match self.check(token, required_game, now).await {
            Ok(claims) => ValidationVerdict::Accepted(claims),
            Err(error) => ValidationVerdict::Rejected(error),
        }
    }

    async fn check(
        &self,
        token: &str,
        required_game: &str,
        now: i64,
    ) -> Result<GameClaims, ValidationError> {
        decode_header_unverified(token).map_err(|_| ValidationError::InvalidToken)?;
        let claims = decode_claims_unverified(token).map_err(|_| ValidationError::InvalidToken)?;

        let platform = claims
            .issuer()
            .and_then(|issuer| self.registry.lookup(issuer))
            .ok_or(ValidationError::UnknownIssuer)?;

        match self.verifier.verify(token, &platform).await {
            Ok(true) => {}
            Ok(false) => return Err(ValidationError::InvalidToken),
            Err(e) => {
                tracing::error!(
                    target: "provider.auth.validator",
                    platform_id = %platform.platform_id,
                    error = %e,
                    "Signature verification unavailable"
                );
                return Err(ValidationError::InternalError);
            }
        }

        if !claims.is_live_at(now) {
            return Err(ValidationError::ExpiredToken);
        }

        if !claims.has_audience(&self.audience) {
            return Err(ValidationError::InvalidAudience);
        }

        if claims.game.as_deref() != Some(required_game) {
            return Err(ValidationError::GameRequestMismatch);
        }

        if !platform.allows_game(required_game) {
            return Err(ValidationError::GameNotAllowedForPlatform);
        }

        Ok(claims)
    }
}
