//! Game Platform configuration.
//!
//! Configuration is loaded from environment variables. Password hashes are
//! redacted in Debug output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default issuer identifier placed in the `iss` claim.
pub const DEFAULT_ISSUER: &str = "platform-A";

/// Default provider identifier placed in the `aud` claim.
pub const DEFAULT_AUDIENCE: &str = "game-provider";

/// Default session TTL in seconds (20 minutes).
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 20 * 60;

/// Maximum session TTL in seconds (24 hours).
pub const MAX_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8081").
    pub bind_address: String,

    /// Stable identifier of this platform (`iss`).
    pub issuer: String,

    /// Stable identifier of the game provider (`aud`).
    pub audience: String,

    /// Sliding session TTL in seconds.
    pub session_ttl_seconds: i64,

    /// Whether the session cookie carries the `Secure` attribute.
    pub session_cookie_secure: bool,

    /// Username -> bcrypt hash. `None` seeds the development user.
    pub users: Option<HashMap<String, String>>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("session_cookie_secure", &self.session_cookie_secure)
            .field("users", &self.users.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid session TTL configuration: {0}")]
    InvalidSessionTtl(String),

    #[error("Invalid boolean for {0}: {1}")]
    InvalidBool(String, String),

    #[error("Invalid PLATFORM_USERS: {0}")]
    InvalidUsers(String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8081".to_string());

        let issuer = vars
            .get("PLATFORM_ISSUER")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ISSUER.to_string());

        let audience = vars
            .get("PLATFORM_AUDIENCE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string());

        let session_ttl_seconds = if let Some(value_str) = vars.get("SESSION_TTL_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidSessionTtl(format!(
                    "SESSION_TTL_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidSessionTtl(format!(
                    "SESSION_TTL_SECONDS must be positive, got {}",
                    value
                )));
            }

            if value > MAX_SESSION_TTL_SECONDS {
                return Err(ConfigError::InvalidSessionTtl(format!(
                    "SESSION_TTL_SECONDS must not exceed {} seconds, got {}",
                    MAX_SESSION_TTL_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_SESSION_TTL_SECONDS
        };

        let session_cookie_secure = match vars.get("SESSION_COOKIE_SECURE") {
            Some(value) => value.parse::<bool>().map_err(|_| {
                ConfigError::InvalidBool("SESSION_COOKIE_SECURE".to_string(), value.clone())
            })?,
            None => false,
        };

        let users = match vars.get("PLATFORM_USERS") {
            Some(json) => {
                let users: HashMap<String, String> = serde_json::from_str(json)
                    .map_err(|e| ConfigError::InvalidUsers(e.to_string()))?;
                if users.is_empty() {
                    return Err(ConfigError::InvalidUsers(
                        "at least one user is required".to_string(),
                    ));
                }
                Some(users)
            }
            None => None,
        };

        Ok(Config {
            bind_address,
            issuer,
            audience,
            session_ttl_seconds,
            session_cookie_secure,
            users,
        })
    }
}
