//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports [`secrecy`] types. Use them for player passwords and anything
//! else that must never reach a log line.
//!
//! `SecretString` implements `Debug` with redaction, so any struct that
//! derives `Debug` around it stays safe to log. Secrets are zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct LoginRequest {
//!     username: String,
//!     password: SecretString,
//! }
//!
//! let json = r#"{"username": "test", "password": "hunter2"}"#;
//! let req: LoginRequest = serde_json::from_str(json).unwrap();
//!
//! assert!(!format!("{req:?}").contains("hunter2"));
//! assert_eq!(req.password.expose_secret(), "hunter2");
//! ```

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretString};
