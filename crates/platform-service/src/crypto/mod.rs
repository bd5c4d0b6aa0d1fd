//! Signing key material for the platform.
//!
//! A [`KeyManager`] owns one RSA-2048 keypair for the lifetime of the
//! process. The private half is only ever handed to `jsonwebtoken` as an
//! [`EncodingKey`]; the public half is projected into a [`JwkSet`] for the
//! `/.well-known/jwks.json` endpoint.

use crate::errors::PlatformError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use common::jwk::{Jwk, JwkSet};
use jsonwebtoken::EncodingKey;
use ring::rand::{SecureRandom, SystemRandom};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use std::fmt;
use tracing::instrument;

/// Modulus size for generated signing keys.
pub const RSA_KEY_BITS: usize = 2048;

/// Bcrypt cost used for password hashes created by the platform.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Lowest accepted bcrypt cost (bcrypt's own floor).
pub const MIN_BCRYPT_COST: u32 = 4;

/// Highest accepted bcrypt cost.
pub const MAX_BCRYPT_COST: u32 = 14;

pub struct KeyManager {
    kid: String,
    signing_key: EncodingKey,
    public_key_set: JwkSet,
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("kid", &self.kid)
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

impl KeyManager {
    /// Generate a fresh RSA-2048 keypair with a random key id.
    pub fn generate() -> Result<Self, PlatformError> {
        Self::generate_with_bits(RSA_KEY_BITS)
    }

    /// Generate a keypair with the given modulus size.
    ///
    /// Sizes below 2048 bits are refused.
    #[instrument(skip_all, fields(bits = bits))]
    pub fn generate_with_bits(bits: usize) -> Result<Self, PlatformError> {
        if bits < RSA_KEY_BITS {
            return Err(PlatformError::Crypto(format!(
                "RSA key size must be at least {} bits, got {}",
                RSA_KEY_BITS, bits
            )));
        }

        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| PlatformError::Crypto(format!("Keypair generation failed: {}", e)))?;

        let kid = uuid::Uuid::new_v4().to_string();
        let key_manager = Self::from_private_key(kid, &private_key)?;

        tracing::info!(
            target: "platform.crypto",
            kid = %key_manager.kid,
            bits = bits,
            "Generated signing key"
        );

        Ok(key_manager)
    }

    fn from_private_key(kid: String, private_key: &RsaPrivateKey) -> Result<Self, PlatformError> {
        let der = private_key
            .to_pkcs1_der()
            .map_err(|e| PlatformError::Crypto(format!("Key encoding failed: {}", e)))?;
        let signing_key = EncodingKey::from_rsa_der(der.as_bytes());

        let n = URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be());
        let public_key_set = JwkSet {
            keys: vec![Jwk::rsa_signing_key(&kid, n, e)],
        };

        Ok(Self {
            kid,
            signing_key,
            public_key_set,
        })
    }

    /// Key id placed in the `kid` header of every issued token.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub(crate) fn signing_key(&self) -> &EncodingKey {
        &self.signing_key
    }

    /// Public key-set document containing exactly the current key.
    pub fn public_key_set(&self) -> &JwkSet {
        &self.public_key_set
    }
}

// ============================================================================
// Passwords and randomness
// ============================================================================

/// Hash a password with bcrypt at the given cost.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, PlatformError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(PlatformError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    bcrypt::hash(password, cost)
        .map_err(|e| PlatformError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a bcrypt hash.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PlatformError> {
    bcrypt::verify(password, hash)
        .map_err(|e| PlatformError::Crypto(format!("Password verification failed: {}", e)))
}

/// Generate cryptographically secure random bytes
pub fn generate_random_bytes(len: usize) -> Result<Vec<u8>, PlatformError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|e| PlatformError::Crypto(format!("Random bytes generation failed: {}", e)))?;
    Ok(bytes)
}
