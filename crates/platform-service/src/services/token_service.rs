use crate::crypto::KeyManager;
use crate::errors::PlatformError;
use crate::observability::metrics::record_token_issuance;
use chrono::{Duration, Utc};
use common::jwt::GameClaims;
use jsonwebtoken::{encode, Algorithm, Header};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Lifetime of an issued game access token (20 minutes).
pub const TOKEN_TTL: Duration = Duration::minutes(20);

/// Mints RS256 game access tokens for authenticated players.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    key_manager: Arc<KeyManager>,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(key_manager: Arc<KeyManager>, issuer: &str, audience: &str) -> Self {
        Self {
            key_manager,
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            ttl: TOKEN_TTL,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a signed token binding `identity` to `game`.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` if `identity` is empty
    /// - `MissingGameId` if `game` is empty
    /// - `Signing` if the RSA signing operation fails
    pub fn issue(&self, identity: &str, game: &str) -> Result<String, PlatformError> {
        let start = Instant::now();
        let result = self.issue_at(identity, game, Utc::now().timestamp());

        let status = if result.is_ok() { "success" } else { "error" };
        record_token_issuance(status, start.elapsed());

        result
    }

    #[instrument(skip_all, fields(game = %game))]
    pub(crate) fn issue_at(
        &self,
        identity: &str,
        game: &str,
        now: i64,
    ) -> Result<String, PlatformError> {
        if identity.is_empty() {
            return Err(PlatformError::NotAuthenticated);
        }
        if game.is_empty() {
            return Err(PlatformError::MissingGameId);
        }

        let token_id = uuid::Uuid::new_v4().to_string();
        let claims = GameClaims::new(
            &self.issuer,
            identity,
            &self.audience,
            game,
            &token_id,
            now,
            now + self.ttl.num_seconds(),
        );

        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.key_manager.kid().to_string());

        let token = encode(&header, &claims, self.key_manager.signing_key()).map_err(|e| {
            tracing::error!(target: "platform.token", error = %e, "Token signing failed");
            PlatformError::Signing(format!("JWT signing operation failed: {}", e))
        })?;

        tracing::info!(target: "platform.token", jti = %token_id, "Issued game access token");

        Ok(token)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::jwt::{decode_claims_unverified, decode_header_unverified, Audience};
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use std::sync::OnceLock;

    fn shared_keys() -> Arc<KeyManager> {
        static KEYS: OnceLock<Arc<KeyManager>> = OnceLock::new();
        Arc::clone(KEYS.get_or_init(|| Arc::new(KeyManager::generate().unwrap())))
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(shared_keys(), "platform-A", "game-provider")
    }

    #[test]
    fn test_issue_builds_expected_claims() {
        let now = 1_700_000_000;
        let token = issuer().issue_at("player-1", "game-roulette", now).unwrap();
        let claims = decode_claims_unverified(&token).unwrap();

        assert_eq!(claims.iss.as_deref(), Some("platform-A"));
        assert_eq!(claims.sub.as_deref(), Some("player-1"));
        assert_eq!(
            claims.aud,
            Some(Audience::Single("game-provider".to_string()))
        );
        assert_eq!(claims.game.as_deref(), Some("game-roulette"));
        assert_eq!(claims.iat, Some(now));
        assert_eq!(claims.exp, Some(now + 1200));
        assert!(uuid::Uuid::parse_str(claims.jti.as_deref().unwrap()).is_ok());
    }

    #[test]
    fn test_issue_header_carries_kid() {
        let keys = shared_keys();
        let token = issuer().issue("player-1", "game-slots").unwrap();
        let header = decode_header_unverified(&token).unwrap();

        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.typ.as_deref(), Some("JWT"));
        assert_eq!(header.kid.as_deref(), Some(keys.kid()));
    }

    #[test]
    fn test_issued_token_verifies_with_public_key() {
        let keys = shared_keys();
        let token = issuer().issue("player-1", "game-slots").unwrap();

        let jwk = keys.public_key_set().first().unwrap();
        let decoding_key =
            DecodingKey::from_rsa_components(jwk.n.as_deref().unwrap(), jwk.e.as_deref().unwrap())
                .unwrap();
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["game-provider"]);

        let decoded = decode::<GameClaims>(&token, &decoding_key, &validation).unwrap();
        assert_eq!(decoded.claims.game.as_deref(), Some("game-slots"));
    }

    #[test]
    fn test_token_ids_are_unique() {
        let issuer = issuer();
        let a = decode_claims_unverified(&issuer.issue("p", "g").unwrap()).unwrap();
        let b = decode_claims_unverified(&issuer.issue("p", "g").unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_issue_rejects_empty_identity() {
        assert!(matches!(
            issuer().issue("", "game-slots"),
            Err(PlatformError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_issue_rejects_empty_game() {
        assert!(matches!(
            issuer().issue("player-1", ""),
            Err(PlatformError::MissingGameId)
        ));
    }
}
