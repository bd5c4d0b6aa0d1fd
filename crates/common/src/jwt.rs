//! Game access token format shared by the platform and the provider.
//!
//! This module provides:
//! - The claims carried by a game access token ([`GameClaims`])
//! - The `aud` claim, which may be a single string or an array ([`Audience`])
//! - Size limits for DoS prevention
//! - Unverified header and claims decoding for the validation entry point
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Decoding here never verifies a signature; callers MUST verify the token
//!   before trusting any claim value
//! - The `sub` field in [`GameClaims`] is redacted in Debug output
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{decode_claims_unverified, decode_header_unverified};
//!
//! let header = decode_header_unverified(token)?;
//! let claims = decode_claims_unverified(token)?;
//! // look up the issuer, fetch keys, verify the signature, then check claims
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::Header;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed token size in bytes (8KB).
///
/// Tokens larger than this are rejected BEFORE any base64 decoding or
/// signature work. A game access token is ~600 bytes (RS256 signature plus
/// seven short claims), so the limit leaves generous headroom.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Name of the custom claim binding a token to a single game.
pub const GAME_CLAIM: &str = "game";

// =============================================================================
// Error Types
// =============================================================================

/// Errors produced while decoding an untrusted compact token.
///
/// Messages are intentionally generic; details are logged at debug level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtParseError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid")]
    TokenTooLarge,

    /// Token is not three base64url segments with JSON header and claims.
    #[error("The access token is invalid")]
    MalformedToken,
}

// =============================================================================
// Claims Types
// =============================================================================

/// Audience claim (`aud`).
///
/// RFC 7519 allows either a single string or an array of strings; issuers
/// that target exactly one recipient usually emit the string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// `"aud": "game-provider"`
    Single(String),
    /// `"aud": ["game-provider", "..."]`
    Multiple(Vec<String>),
}

impl Audience {
    /// Whether `audience` is one of the intended recipients.
    #[must_use]
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Multiple(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Claims carried by a game access token.
///
/// Every field is optional on the wire so that a token missing a claim still
/// parses; the validator then rejects it with the error specific to the
/// missing claim (e.g. no `exp` is an expired token, no `iss` an unknown
/// issuer). Tokens minted by the platform always populate every field.
///
/// Timestamps are Unix epoch seconds.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameClaims {
    /// Issuer (platform identifier).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject (player identity) - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Intended recipients (provider identifier).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Game this token grants access to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,

    /// Unique token identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Issued-at timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl fmt::Debug for GameClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameClaims")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("aud", &self.aud)
            .field("game", &self.game)
            .field("jti", &self.jti)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

impl GameClaims {
    /// Build a fully populated claims set.
    ///
    /// # Arguments
    ///
    /// * `issuer` - Platform identifier (`iss`)
    /// * `subject` - Player identity (`sub`)
    /// * `audience` - Provider identifier (`aud`)
    /// * `game` - Game the token is bound to
    /// * `token_id` - Unique token identifier (`jti`)
    /// * `issued_at` - Issued-at timestamp (`iat`)
    /// * `expires_at` - Expiration timestamp (`exp`)
    #[must_use]
    pub fn new(
        issuer: &str,
        subject: &str,
        audience: &str,
        game: &str,
        token_id: &str,
        issued_at: i64,
        expires_at: i64,
    ) -> Self {
        Self {
            iss: Some(issuer.to_string()),
            sub: Some(subject.to_string()),
            aud: Some(Audience::Single(audience.to_string())),
            game: Some(game.to_string()),
            jti: Some(token_id.to_string()),
            iat: Some(issued_at),
            exp: Some(expires_at),
        }
    }

    /// Issuer, treating an empty string as absent.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.iss.as_deref().filter(|iss| !iss.is_empty())
    }

    /// Whether `audience` is among the token's intended recipients.
    #[must_use]
    pub fn has_audience(&self, audience: &str) -> bool {
        self.aud.as_ref().is_some_and(|aud| aud.contains(audience))
    }

    /// Whether the token is still valid at `now` (strictly before `exp`).
    ///
    /// A token without `exp` is never considered live.
    #[must_use]
    pub fn is_live_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp > now)
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Split a compact token into its three segments after the size check.
fn split_compact(token: &str) -> Result<(&str, &str, &str), JwtParseError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtParseError::TokenTooLarge);
    }

    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(claims), Some(signature), None)
            if !header.is_empty() && !claims.is_empty() =>
        {
            Ok((header, claims, signature))
        }
        _ => {
            tracing::debug!(target: "common.jwt", "Token rejected: invalid compact format");
            Err(JwtParseError::MalformedToken)
        }
    }
}

/// Decode the JOSE header of a compact token without verifying it.
///
/// Rejects oversized tokens, tokens that are not three segments, and headers
/// naming an algorithm `jsonwebtoken` does not know (including `none`).
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong structure, bad base64 or invalid header JSON
pub fn decode_header_unverified(token: &str) -> Result<Header, JwtParseError> {
    split_compact(token)?;

    jsonwebtoken::decode_header(token).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode token header");
        JwtParseError::MalformedToken
    })
}

/// Decode the claims of a compact token without verifying the signature.
///
/// # Security
///
/// The returned claims are NOT authoritative. They may only be used to
/// locate the issuer's key set; every trust decision must wait until the
/// signature has been verified.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong structure, bad base64 or claims that are not a
///   JSON object of the expected shape
pub fn decode_claims_unverified(token: &str) -> Result<GameClaims, JwtParseError> {
    let (_, claims_part, _) = split_compact(token)?;

    let claims_bytes = URL_SAFE_NO_PAD.decode(claims_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode token claims base64");
        JwtParseError::MalformedToken
    })?;

    serde_json::from_slice(&claims_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse token claims JSON");
        JwtParseError::MalformedToken
    })
}

// =============================================================================
// Tests
// =============================================================================
