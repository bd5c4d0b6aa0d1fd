//! RS256 signature verification against a platform's published keys.
//!
//! # Key selection
//!
//! The key whose `kid` matches the token header is used. When the header
//! has no `kid`, or none matches, the first key in the set is used instead.
//! That fallback keeps single-key platforms working but is ambiguous once a
//! platform publishes two keys, so every use is logged at warn and counted.

use crate::auth::jwks::{JwksCache, JwksError};
use crate::observability::metrics::record_key_fallback;
use crate::registry::PlatformInfo;
use common::jwk::{Jwk, JwkSet, ALG_RS256, KTY_RSA};
use common::jwt::{decode_header_unverified, GameClaims};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Infrastructure failure while verifying a signature.
///
/// A token that simply does not verify is `Ok(false)`, not an error.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Key set unavailable: {0}")]
    KeySet(#[from] JwksError),
}

pub struct SignatureVerifier {
    jwks_cache: Arc<JwksCache>,
}

impl SignatureVerifier {
    pub fn new(jwks_cache: Arc<JwksCache>) -> Self {
        Self { jwks_cache }
    }

    /// Verify `token`'s signature with `platform`'s published keys.
    ///
    /// Returns `Ok(false)` for an unreadable header, an empty key set, an
    /// unusable key, or a signature that does not match.
    ///
    /// # Errors
    ///
    /// `VerificationError::KeySet` if the key set cannot be fetched.
    #[instrument(skip_all, fields(platform_id = %platform.platform_id))]
    pub async fn verify(
        &self,
        token: &str,
        platform: &PlatformInfo,
    ) -> Result<bool, VerificationError> {
        let Ok(header) = decode_header_unverified(token) else {
            tracing::debug!(target: "provider.auth.verifier", "Token header unreadable");
            return Ok(false);
        };

        let key_set = self.jwks_cache.fetch(&platform.jwks_url).await?;

        let Some(jwk) = select_key(&key_set, header.kid.as_deref()) else {
            tracing::warn!(target: "provider.auth.verifier", "Platform published an empty key set");
            return Ok(false);
        };

        Ok(verify_with_jwk(token, jwk))
    }
}

/// Pick the verification key for a token's `kid`.
///
/// Exact `kid` match first; otherwise the first key in the set. `None` only
/// when the set is empty.
pub fn select_key<'a>(key_set: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
    if let Some(key) = kid.and_then(|kid| key_set.find(kid)) {
        return Some(key);
    }

    let first = key_set.first()?;
    tracing::warn!(
        target: "provider.auth.verifier",
        kid_present = kid.is_some(),
        key_count = key_set.len(),
        "No key matched token kid, falling back to first key in set"
    );
    record_key_fallback();
    Some(first)
}

/// Check an RS256 signature. Claims are not validated here.
fn verify_with_jwk(token: &str, jwk: &Jwk) -> bool {
    if jwk.kty != KTY_RSA {
        tracing::debug!(target: "provider.auth.verifier", kty = %jwk.kty, "Selected key is not RSA");
        return false;
    }
    if jwk.alg.as_deref().is_some_and(|alg| alg != ALG_RS256) {
        tracing::debug!(target: "provider.auth.verifier", "Selected key is not an RS256 key");
        return false;
    }

    let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
        tracing::debug!(target: "provider.auth.verifier", "Selected key has no RSA components");
        return false;
    };

    let decoding_key = match DecodingKey::from_rsa_components(n, e) {
        Ok(key) => key,
        Err(e) => {
            tracing::debug!(target: "provider.auth.verifier", error = %e, "Selected key is malformed");
            return false;
        }
    };

    // Signature only; expiry and audience belong to the validator's chain.
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match decode::<GameClaims>(token, &decoding_key, &validation) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(target: "provider.auth.verifier", error = %e, "Signature verification failed");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use platform_test_utils::keys::valid_claims;
    use platform_test_utils::TestKeypair;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve_keys(keys: Vec<Jwk>) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(JwkSet { keys }))
            .mount(&server)
            .await;
        server
    }

    fn platform(server: &MockServer) -> PlatformInfo {
        PlatformInfo::new(
            "platform-A",
            &format!("{}/jwks", server.uri()),
            ["game-roulette"],
        )
    }

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(Arc::new(JwksCache::new()))
    }

    #[test]
    fn test_select_key_by_kid() {
        let set = JwkSet {
            keys: vec![
                TestKeypair::primary().jwk(),
                TestKeypair::secondary().jwk(),
            ],
        };
        let key = select_key(&set, Some("test-key-2")).unwrap();
        assert_eq!(key.kid.as_deref(), Some("test-key-2"));
    }

    #[test]
    fn test_select_key_falls_back_to_first() {
        let set = JwkSet {
            keys: vec![
                TestKeypair::secondary().jwk(),
                TestKeypair::primary().jwk(),
            ],
        };
        assert_eq!(
            select_key(&set, Some("unknown")).unwrap().kid.as_deref(),
            Some("test-key-2")
        );
        assert_eq!(
            select_key(&set, None).unwrap().kid.as_deref(),
            Some("test-key-2")
        );
    }

    #[test]
    fn test_select_key_empty_set() {
        assert!(select_key(&JwkSet::default(), Some("k")).is_none());
        assert!(select_key(&JwkSet::default(), None).is_none());
    }

    #[tokio::test]
    async fn test_verify_valid_signature() {
        let keys = TestKeypair::primary();
        let server = serve_keys(vec![keys.jwk()]).await;
        let token = keys.sign(&valid_claims(1_700_000_000));

        assert!(verifier().verify(&token, &platform(&server)).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_ignores_expiry() {
        let keys = TestKeypair::primary();
        let server = serve_keys(vec![keys.jwk()]).await;
        // Expired long ago; the signature is still genuine
        let token = keys.sign(&valid_claims(1_000));

        assert!(verifier().verify(&token, &platform(&server)).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_foreign_key_fails() {
        let server = serve_keys(vec![TestKeypair::primary().jwk()]).await;
        let token = TestKeypair::secondary().sign(&valid_claims(1_700_000_000));

        // kid test-key-2 is unmatched, falls back to test-key-1, which does not verify
        assert!(!verifier().verify(&token, &platform(&server)).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_without_kid_uses_first_key() {
        let keys = TestKeypair::primary();
        let server = serve_keys(vec![keys.jwk()]).await;
        let token = keys.sign_with_kid(&valid_claims(1_700_000_000), None);

        assert!(verifier().verify(&token, &platform(&server)).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_selects_matching_key_among_several() {
        let server = serve_keys(vec![
            TestKeypair::primary().jwk(),
            TestKeypair::secondary().jwk(),
        ])
        .await;
        let token = TestKeypair::secondary().sign(&valid_claims(1_700_000_000));

        assert!(verifier().verify(&token, &platform(&server)).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_empty_key_set_fails_closed() {
        let server = serve_keys(vec![]).await;
        let token = TestKeypair::primary().sign(&valid_claims(1_700_000_000));

        let result = verifier().verify(&token, &platform(&server)).await;
        assert!(matches!(result, Ok(false)));
    }

    #[tokio::test]
    async fn test_verify_tampered_payload_fails() {
        let keys = TestKeypair::primary();
        let server = serve_keys(vec![keys.jwk()]).await;
        let token = keys.sign(&valid_claims(1_700_000_000));

        let other = keys.sign(&GameClaims {
            game: Some("game-slots".to_string()),
            ..valid_claims(1_700_000_000)
        });
        let (header, rest) = token.split_once('.').unwrap();
        let (_, signature) = rest.split_once('.').unwrap();
        let (_, other_rest) = other.split_once('.').unwrap();
        let (other_claims, _) = other_rest.split_once('.').unwrap();
        let spliced = format!("{header}.{other_claims}.{signature}");

        assert!(!verifier().verify(&spliced, &platform(&server)).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_non_rsa_key_fails() {
        let server = serve_keys(vec![Jwk {
            kty: "OKP".to_string(),
            kid: Some("test-key-1".to_string()),
            alg: Some("EdDSA".to_string()),
            key_use: Some("sig".to_string()),
            n: None,
            e: None,
        }])
        .await;
        let token = TestKeypair::primary().sign(&valid_claims(1_700_000_000));

        assert!(!verifier().verify(&token, &platform(&server)).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_garbage_token_is_false() {
        let server = serve_keys(vec![TestKeypair::primary().jwk()]).await;
        assert!(!verifier()
            .verify("not-a-token", &platform(&server))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_verify_key_fetch_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let token = TestKeypair::primary().sign(&valid_claims(1_700_000_000));

        let result = verifier().verify(&token, &platform(&server)).await;
        assert!(matches!(
            result,
            Err(VerificationError::KeySet(JwksError::Status(500)))
        ));
    }
}
