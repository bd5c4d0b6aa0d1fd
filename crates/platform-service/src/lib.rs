//! Game Platform Service Library
//!
//! The issuing side of the game access pipeline: players log in with a
//! password, hold a cookie-backed session, and exchange it for short-lived
//! RS256 tokens bound to one game. The public half of the signing key is
//! published at `/.well-known/jwks.json` for providers to verify against.
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `crypto` - Signing key, password hashing, randomness
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `observability` - Metrics
//! - `routes` - Axum router setup
//! - `services` - Sessions, users, token issuance
//! - `tasks` - Background maintenance

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod observability;
pub mod routes;
pub mod services;
pub mod tasks;
