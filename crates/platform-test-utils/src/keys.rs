//! Throwaway RSA keys for signing test tokens.
//!
//! The real `KeyManager` only signs well-formed claims. Validation tests also
//! need expired tokens, wrong audiences, foreign keys and missing `kid`
//! headers, so this keypair signs whatever it is given.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use common::jwk::{Jwk, JwkSet};
use common::jwt::GameClaims;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use std::sync::OnceLock;

/// Test keypair for signing tokens.
pub struct TestKeypair {
    kid: String,
    encoding_key: EncodingKey,
    jwk: Jwk,
}

impl TestKeypair {
    /// Generate a fresh RSA-2048 keypair tagged with `kid`.
    pub fn generate(kid: &str) -> Self {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048)
            .expect("Failed to generate test keypair");
        let der = private_key
            .to_pkcs1_der()
            .expect("Failed to encode test keypair");

        let jwk = Jwk::rsa_signing_key(
            kid,
            URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be()),
            URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be()),
        );

        Self {
            kid: kid.to_string(),
            encoding_key: EncodingKey::from_rsa_der(der.as_bytes()),
            jwk,
        }
    }

    /// Process-wide keypair with kid `test-key-1`.
    pub fn primary() -> &'static TestKeypair {
        static KEY: OnceLock<TestKeypair> = OnceLock::new();
        KEY.get_or_init(|| TestKeypair::generate("test-key-1"))
    }

    /// Second process-wide keypair with kid `test-key-2`.
    pub fn secondary() -> &'static TestKeypair {
        static KEY: OnceLock<TestKeypair> = OnceLock::new();
        KEY.get_or_init(|| TestKeypair::generate("test-key-2"))
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Public JWK for this keypair.
    pub fn jwk(&self) -> Jwk {
        self.jwk.clone()
    }

    /// Key set containing only this keypair.
    pub fn jwk_set(&self) -> JwkSet {
        JwkSet {
            keys: vec![self.jwk()],
        }
    }

    /// Sign `claims` with an RS256 header carrying this key's `kid`.
    pub fn sign(&self, claims: &GameClaims) -> String {
        self.sign_with_kid(claims, Some(&self.kid))
    }

    /// Sign `claims` with an arbitrary (or no) `kid` header.
    pub fn sign_with_kid(&self, claims: &GameClaims, kid: Option<&str>) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = kid.map(str::to_string);

        encode(&header, claims, &self.encoding_key).expect("Failed to sign token")
    }
}

/// Claims that pass every check for `platform-A` / `game-roulette` at `now`.
pub fn valid_claims(now: i64) -> GameClaims {
    GameClaims::new(
        "platform-A",
        "player-1",
        "game-provider",
        "game-roulette",
        "jti-1",
        now,
        now + 1200,
    )
}
