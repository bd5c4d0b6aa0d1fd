//! Player credential checks.
//!
//! Players are a fixed username -> bcrypt hash table supplied at startup.

use crate::crypto::{self, DEFAULT_BCRYPT_COST};
use crate::errors::PlatformError;
use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::fmt;
use tracing::instrument;

/// Username of the development account seeded when no users are configured.
pub const DEVELOPMENT_USERNAME: &str = "test";

const DEVELOPMENT_PASSWORD: &str = "test";

pub struct UserStore {
    users: HashMap<String, String>,
    // Verified against for unknown usernames so both paths cost one bcrypt run.
    dummy_hash: String,
}

impl fmt::Debug for UserStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserStore")
            .field("users", &self.users.len())
            .finish()
    }
}

impl UserStore {
    /// Build a store from precomputed bcrypt hashes.
    pub fn new(users: HashMap<String, String>) -> Result<Self, PlatformError> {
        Self::with_cost(users, DEFAULT_BCRYPT_COST)
    }

    /// Like [`UserStore::new`] with an explicit cost for the dummy hash.
    pub fn with_cost(users: HashMap<String, String>, cost: u32) -> Result<Self, PlatformError> {
        let dummy_hash = crypto::hash_password("dummy-password-for-timing", cost)?;
        Ok(Self { users, dummy_hash })
    }

    /// A store holding only the `test`/`test` development account.
    pub fn development(cost: u32) -> Result<Self, PlatformError> {
        let hash = crypto::hash_password(DEVELOPMENT_PASSWORD, cost)?;
        tracing::warn!(
            target: "platform.users",
            "No PLATFORM_USERS configured, seeding development account"
        );
        Self::with_cost(
            HashMap::from([(DEVELOPMENT_USERNAME.to_string(), hash)]),
            cost,
        )
    }

    /// Check a username/password pair.
    ///
    /// Returns `Ok(false)` for unknown users and wrong passwords alike.
    #[instrument(skip_all)]
    pub fn verify(&self, username: &str, password: &SecretString) -> Result<bool, PlatformError> {
        let (hash, known) = match self.users.get(username) {
            Some(hash) => (hash.as_str(), true),
            None => (self.dummy_hash.as_str(), false),
        };

        let matches = crypto::verify_password(password.expose_secret(), hash)?;
        Ok(known && matches)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
