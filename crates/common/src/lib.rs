//! Common types shared by the game platform and the game provider.
//!
//! Both services speak the same wire format: a compact RS256-signed token
//! whose claims are [`jwt::GameClaims`], and a JWKS document of RSA public
//! keys ([`jwk::JwkSet`]).

#![warn(clippy::pedantic)]

/// Module for token claims and unverified compact-token parsing
pub mod jwt;

/// Module for the public key-set document (JWKS)
pub mod jwk;

/// Module for secret types that prevent accidental logging
pub mod secret;
