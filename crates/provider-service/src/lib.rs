//! Game Provider Service Library
//!
//! The validating side of the game access pipeline: a game launch presents
//! a bearer token minted by a trusted platform, and the provider checks it
//! against that platform's published keys and its registered games before
//! letting the player in.
//!
//! # Modules
//!
//! - `auth` - Key-set cache, signature verification, validation chain
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `observability` - Metrics
//! - `registry` - Trusted platforms and their games
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod observability;
pub mod registry;
pub mod routes;
