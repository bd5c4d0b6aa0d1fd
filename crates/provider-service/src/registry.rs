//! Platform registry.
//!
//! Maps an issuer identifier (`iss`) to the platform's key-set URL and the
//! games it may grant access to. The validator only sees the
//! [`PlatformRegistry`] trait; the table itself comes from configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Key-set URL shared by the built-in platforms.
pub const DEFAULT_JWKS_URL: &str = "http://localhost:8081/.well-known/jwks.json";

/// Metadata about a trusted platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// Issuer identifier the platform puts in `iss`.
    pub platform_id: String,

    /// Where the platform publishes its public keys.
    pub jwks_url: String,

    /// Games this platform may grant access to.
    #[serde(default)]
    pub registered_games: BTreeSet<String>,
}

impl PlatformInfo {
    pub fn new<I, S>(platform_id: &str, jwks_url: &str, registered_games: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            platform_id: platform_id.to_string(),
            jwks_url: jwks_url.to_string(),
            registered_games: registered_games.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `game` is in this platform's registered set.
    pub fn allows_game(&self, game: &str) -> bool {
        self.registered_games.contains(game)
    }
}

/// Lookup from issuer identifier to platform metadata.
pub trait PlatformRegistry: Send + Sync {
    fn lookup(&self, platform_id: &str) -> Option<Arc<PlatformInfo>>;
}

/// Immutable registry built once at startup.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlatformRegistry {
    platforms: HashMap<String, Arc<PlatformInfo>>,
}

impl InMemoryPlatformRegistry {
    /// Build a registry; a later entry with the same id replaces an earlier one.
    pub fn new(platforms: impl IntoIterator<Item = PlatformInfo>) -> Self {
        Self {
            platforms: platforms
                .into_iter()
                .map(|info| (info.platform_id.clone(), Arc::new(info)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

impl PlatformRegistry for InMemoryPlatformRegistry {
    fn lookup(&self, platform_id: &str) -> Option<Arc<PlatformInfo>> {
        self.platforms.get(platform_id).cloned()
    }
}

/// The development table: two platforms sharing one key-set URL.
pub fn builtin_platforms() -> Vec<PlatformInfo> {
    vec![
        PlatformInfo::new(
            "platform-A",
            DEFAULT_JWKS_URL,
            ["game-roulette", "game-slots"],
        ),
        PlatformInfo::new("platform-B", DEFAULT_JWKS_URL, ["game-slots"]),
    ]
}
