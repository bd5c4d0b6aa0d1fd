//! Game Provider configuration.

use crate::registry::{builtin_platforms, PlatformInfo};
use std::collections::{HashMap, HashSet};
use std::env;
use thiserror::Error;

/// Default provider identifier required in the `aud` claim.
pub const DEFAULT_AUDIENCE: &str = "game-provider";

/// Default key-set cache TTL in seconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Maximum key-set cache TTL in seconds (1 hour).
pub const MAX_JWKS_CACHE_TTL_SECONDS: u64 = 3600;

/// Default timeout for key-set fetches in seconds.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Identifier this provider expects in `aud`.
    pub audience: String,

    /// How long a fetched key set is served from cache.
    pub jwks_cache_ttl_seconds: u64,

    /// HTTP timeout for key-set fetches.
    pub jwks_fetch_timeout_seconds: u64,

    /// Trusted platforms.
    pub platforms: Vec<PlatformInfo>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid JWKS cache TTL configuration: {0}")]
    InvalidJwksCacheTtl(String),

    #[error("Invalid JWKS fetch timeout: {0}")]
    InvalidFetchTimeout(String),

    #[error("Invalid PLATFORM_REGISTRY: {0}")]
    InvalidRegistry(String),
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
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let audience = vars
            .get("PROVIDER_AUDIENCE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string());

        let jwks_cache_ttl_seconds = if let Some(value_str) = vars.get("JWKS_CACHE_TTL_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwksCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 || value > MAX_JWKS_CACHE_TTL_SECONDS {
                return Err(ConfigError::InvalidJwksCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must be between 1 and {}, got {}",
                    MAX_JWKS_CACHE_TTL_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_JWKS_CACHE_TTL_SECONDS
        };

        let jwks_fetch_timeout_seconds =
            if let Some(value_str) = vars.get("JWKS_FETCH_TIMEOUT_SECONDS") {
                match value_str.parse::<u64>() {
                    Ok(value) if value > 0 => value,
                    _ => {
                        return Err(ConfigError::InvalidFetchTimeout(format!(
                            "JWKS_FETCH_TIMEOUT_SECONDS must be a positive integer, got '{}'",
                            value_str
                        )))
                    }
                }
            } else {
                DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS
            };

        let platforms = match vars.get("PLATFORM_REGISTRY") {
            Some(json) => parse_registry(json)?,
            None => builtin_platforms(),
        };

        Ok(Config {
            bind_address,
            audience,
            jwks_cache_ttl_seconds,
            jwks_fetch_timeout_seconds,
            platforms,
        })
    }
}

fn parse_registry(json: &str) -> Result<Vec<PlatformInfo>, ConfigError> {
    let platforms: Vec<PlatformInfo> =
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidRegistry(e.to_string()))?;

    let mut seen = HashSet::new();
    for platform in &platforms {
        if platform.platform_id.is_empty() {
            return Err(ConfigError::InvalidRegistry(
                "platform_id must not be empty".to_string(),
            ));
        }
        if !platform.jwks_url.starts_with("http://") && !platform.jwks_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidRegistry(format!(
                "jwks_url for {} must be an http(s) URL",
                platform.platform_id
            )));
        }
        if !seen.insert(platform.platform_id.as_str()) {
            return Err(ConfigError::InvalidRegistry(format!(
                "duplicate platform_id {}",
                platform.platform_id
            )));
        }
    }

    Ok(platforms)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_defaults() {
        let config = Config::from_vars(&HashMap::new()).unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.audience, "game-provider");
        assert_eq!(config.jwks_cache_ttl_seconds, 300);
        assert_eq!(config.jwks_fetch_timeout_seconds, 10);
        assert_eq!(config.platforms, builtin_platforms());
    }

    #[test]
    fn test_from_vars_custom_values() {
        let vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:9090".to_string()),
            ("PROVIDER_AUDIENCE".to_string(), "casino".to_string()),
            ("JWKS_CACHE_TTL_SECONDS".to_string(), "60".to_string()),
            ("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "3".to_string()),
            (
                "PLATFORM_REGISTRY".to_string(),
                r#"[{"platform_id":"p1","jwks_url":"https://p1/jwks","registered_games":["g"]}]"#
                    .to_string(),
            ),
        ]);

        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9090");
        assert_eq!(config.audience, "casino");
        assert_eq!(config.jwks_cache_ttl_seconds, 60);
        assert_eq!(config.jwks_fetch_timeout_seconds, 3);
        assert_eq!(config.platforms.len(), 1);
        assert!(config.platforms.first().unwrap().allows_game("g"));
    }

    #[test]
    fn test_jwks_cache_ttl_out_of_range() {
        for bad in ["0", "3601", "-5", "soon"] {
            let vars = HashMap::from([("JWKS_CACHE_TTL_SECONDS".to_string(), bad.to_string())]);
            assert!(
                matches!(
                    Config::from_vars(&vars),
                    Err(ConfigError::InvalidJwksCacheTtl(_))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_fetch_timeout_invalid() {
        let vars = HashMap::from([("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "0".to_string())]);
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidFetchTimeout(_))
        ));
    }

    #[test]
    fn test_registry_not_json() {
        let vars = HashMap::from([("PLATFORM_REGISTRY".to_string(), "platform-A".to_string())]);
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidRegistry(_))
        ));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let json = r#"[
            {"platform_id":"p1","jwks_url":"http://a/jwks"},
            {"platform_id":"p1","jwks_url":"http://b/jwks"}
        ]"#;
        let vars = HashMap::from([("PLATFORM_REGISTRY".to_string(), json.to_string())]);
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidRegistry(msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn test_registry_rejects_bad_url() {
        let json = r#"[{"platform_id":"p1","jwks_url":"file:///etc/passwd"}]"#;
        let vars = HashMap::from([("PLATFORM_REGISTRY".to_string(), json.to_string())]);
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidRegistry(msg)) if msg.contains("http(s)")
        ));
    }

    #[test]
    fn test_registry_rejects_empty_id() {
        let json = r#"[{"platform_id":"","jwks_url":"http://a/jwks"}]"#;
        let vars = HashMap::from([("PLATFORM_REGISTRY".to_string(), json.to_string())]);
        assert!(Config::from_vars(&vars).is_err());
    }
}
