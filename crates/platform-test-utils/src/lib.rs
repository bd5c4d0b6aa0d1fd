//! # Platform Test Utilities
//!
//! Shared test utilities for the Game Platform service.
//!
//! This crate provides:
//! - Server test harness (`TestPlatformServer` for E2E tests)
//! - A process-wide signing key so tests do not pay for RSA keygen each time
//! - `TestKeypair` for signing arbitrary (including invalid) claims
//!
//! ## Usage
//!
//! ```rust,ignore
//! use platform_test_utils::TestPlatformServer;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestPlatformServer::spawn().await?;
//!     let client = reqwest::Client::new();
//!
//!     let cookie = server.login(&client, "test", "test").await?;
//!     let token = server.issue(&client, &cookie, "game-slots").await?;
//!     assert_eq!(token.split('.').count(), 3);
//!     Ok(())
//! }
//! ```

pub mod keys;
pub mod server_harness;

pub use keys::TestKeypair;
pub use server_harness::{shared_key_manager, TestPlatformServer};
