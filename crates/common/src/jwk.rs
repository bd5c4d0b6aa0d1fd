//! JSON Web Key Set (RFC 7517) for RSA signing keys.
//!
//! The platform publishes its public key as a [`JwkSet`] at
//! `/.well-known/jwks.json`; the provider fetches and parses the same
//! document to verify tokens. Only public components (`n`, `e`) are ever
//! carried.

use serde::{Deserialize, Serialize};

/// Key type for RSA keys.
pub const KTY_RSA: &str = "RSA";

/// Algorithm tag for RSASSA-PKCS1-v1_5 with SHA-256.
pub const ALG_RS256: &str = "RS256";

/// Public key use: signature verification.
pub const USE_SIG: &str = "sig";

/// A single JSON Web Key.
///
/// Parsing is lenient about optional members so that key sets published by
/// other issuers (which may include non-RSA keys) still load; a key that
/// cannot be used for RS256 simply fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type (`RSA` for keys published by the platform).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Algorithm (`RS256`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Key use (`sig`).
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url, no padding).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent (base64url, no padding).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl Jwk {
    /// Build an RS256 signing JWK from base64url-encoded public components.
    #[must_use]
    pub fn rsa_signing_key(kid: &str, n: String, e: String) -> Self {
        Self {
            kty: KTY_RSA.to_string(),
            kid: Some(kid.to_string()),
            alg: Some(ALG_RS256.to_string()),
            key_use: Some(USE_SIG.to_string()),
            n: Some(n),
            e: Some(e),
        }
    }
}

/// A key-set document: `{"keys": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    /// Keys in publication order.
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Find the key whose `kid` equals `kid`.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }

    /// First key in publication order.
    #[must_use]
    pub fn first(&self) -> Option<&Jwk> {
        self.keys.first()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }
}
