//! In-memory player sessions with sliding expiration.
//!
//! Each entry is an immutable [`Session`] snapshot. A touch builds a new
//! snapshot and swaps it in while holding the entry's shard lock, so a
//! concurrent touch and invalidate on the same id never observe a torn
//! record: whichever takes the lock last wins.

use crate::crypto;
use crate::errors::PlatformError;
use crate::observability::metrics::{record_session_event, record_sessions_purged};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Default sliding TTL for sessions (20 minutes).
pub const DEFAULT_SESSION_TTL: Duration = Duration::minutes(20);

/// Random bytes in a session identifier (256 bits).
const SESSION_ID_BYTES: usize = 32;

/// Attempts at drawing an unused identifier before giving up.
const MAX_ID_ATTEMPTS: usize = 4;

/// An authenticated player session.
///
/// The session id is a bearer secret and the identity is personal data; both
/// are redacted in Debug output.
#[derive(Clone)]
pub struct Session {
    pub session_id: String,
    pub identity: String,
    pub expires_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &"[REDACTED]")
            .field("identity", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("last_accessed_at", &self.last_accessed_at)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl Session {
    /// Whether the session is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// A copy of this session with a fresh `ttl` window starting at `now`.
    fn touched_at(&self, now: DateTime<Utc>, ttl: Duration) -> Result<Self, PlatformError> {
        Ok(Self {
            session_id: self.session_id.clone(),
            identity: self.identity.clone(),
            expires_at: expiry_after(now, ttl)?,
            last_accessed_at: now,
            ttl,
        })
    }
}

/// `now + ttl`, refusing windows that are empty, negative or unrepresentable.
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, PlatformError> {
    if ttl <= Duration::zero() {
        tracing::warn!(target: "platform.session", ttl_seconds = ttl.num_seconds(), "Rejected non-positive session TTL");
        return Err(PlatformError::Internal);
    }

    now.checked_add_signed(ttl).ok_or_else(|| {
        tracing::warn!(target: "platform.session", "Session expiry out of range");
        PlatformError::Internal
    })
}

pub struct SessionStore {
    sessions: DashMap<String, Arc<Session>>,
    default_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_SESSION_TTL)
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Create a session for `identity`.
    ///
    /// `ttl` falls back to the store's default when `None`.
    ///
    /// # Errors
    ///
    /// `Internal` if `ttl` is not positive or the expiry is out of range.
    pub fn create(&self, identity: &str, ttl: Option<Duration>) -> Result<Arc<Session>, PlatformError> {
        self.create_at(identity, ttl, Utc::now())
    }

    #[instrument(skip_all)]
    pub(crate) fn create_at(
        &self,
        identity: &str,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<Arc<Session>, PlatformError> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let expires_at = expiry_after(now, ttl)?;

        for _ in 0..MAX_ID_ATTEMPTS {
            let session_id = generate_session_id()?;

            // Only claim a vacant slot; a live session is never overwritten.
            if let Entry::Vacant(slot) = self.sessions.entry(session_id.clone()) {
                let session = Arc::new(Session {
                    session_id,
                    identity: identity.to_string(),
                    expires_at,
                    last_accessed_at: now,
                    ttl,
                });
                slot.insert(Arc::clone(&session));

                record_session_event("created");
                tracing::debug!(
                    target: "platform.session",
                    expires_at = %session.expires_at,
                    "Session created"
                );
                return Ok(session);
            }

            tracing::warn!(target: "platform.session", "Session id collision, retrying");
        }

        Err(PlatformError::Internal)
    }

    /// Look up a live session, optionally extending it.
    ///
    /// Unknown and expired ids both yield `None`; an expired entry is
    /// evicted as a side effect. A touch extends the session by the store's
    /// default TTL, whatever TTL it was created with.
    pub fn get(&self, session_id: &str, touch: bool) -> Option<Arc<Session>> {
        self.get_at(session_id, touch, Utc::now())
    }

    #[instrument(skip_all, fields(touch = touch))]
    pub(crate) fn get_at(
        &self,
        session_id: &str,
        touch: bool,
        now: DateTime<Utc>,
    ) -> Option<Arc<Session>> {
        match self.sessions.entry(session_id.to_string()) {
            Entry::Vacant(_) => None,
            Entry::Occupied(mut entry) => {
                if entry.get().is_expired_at(now) {
                    entry.remove();
                    record_session_event("expired");
                    tracing::debug!(target: "platform.session", "Expired session evicted");
                    return None;
                }

                if !touch {
                    return Some(Arc::clone(entry.get()));
                }

                match entry.get().touched_at(now, self.default_ttl) {
                    Ok(refreshed) => {
                        let refreshed = Arc::new(refreshed);
                        entry.insert(Arc::clone(&refreshed));
                        Some(refreshed)
                    }
                    // Still live; keep the current window rather than corrupt it
                    Err(_) => Some(Arc::clone(entry.get())),
                }
            }
        }
    }

    /// Remove a session. Unknown ids are a no-op.
    ///
    /// Returns whether a session was removed.
    pub fn invalidate(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            record_session_event("invalidated");
            tracing::debug!(target: "platform.session", "Session invalidated");
        }
        removed
    }

    /// Drop every session already expired at `now`.
    ///
    /// Returns the number of sessions removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub(crate) fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut purged = 0;
        self.sessions.retain(|_, session| {
            let keep = !session.is_expired_at(now);
            if !keep {
                purged += 1;
            }
            keep
        });
        record_sessions_purged(purged);
        purged
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn generate_session_id() -> Result<String, PlatformError> {
    let bytes = crypto::generate_random_bytes(SESSION_ID_BYTES)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_create_uses_default_ttl() {
        let store = SessionStore::new();
        let session = store.create_at("player", None, t0()).unwrap();

        assert_eq!(session.identity, "player");
        assert_eq!(session.last_accessed_at, t0());
        assert_eq!(session.expires_at, t0() + Duration::minutes(20));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_with_explicit_ttl() {
        let store = SessionStore::new();
        let session = store
            .create_at("player", Some(Duration::seconds(30)), t0())
            .unwrap();
        assert_eq!(session.expires_at, t0() + Duration::seconds(30));
        assert_eq!(session.ttl, Duration::seconds(30));
    }

    #[test]
    fn test_session_ids_are_unique_and_long() {
        let store = SessionStore::new();
        let ids: HashSet<String> = (0..100)
            .map(|_| store.create("player", None).unwrap().session_id.clone())
            .collect();

        assert_eq!(ids.len(), 100);
        // 32 random bytes -> 43 base64url characters
        assert!(ids.iter().all(|id| id.len() == 43));
    }

    #[test]
    fn test_get_unknown_session() {
        let store = SessionStore::new();
        assert!(store.get("nope", false).is_none());
        assert!(store.get("nope", true).is_none());
    }

    #[test]
    fn test_get_without_touch_keeps_expiry() {
        let store = SessionStore::new();
        let created = store.create_at("player", None, t0()).unwrap();

        let later = t0() + Duration::minutes(5);
        let fetched = store.get_at(&created.session_id, false, later).unwrap();
        assert_eq!(fetched.expires_at, created.expires_at);
        assert_eq!(fetched.last_accessed_at, t0());
    }

    #[test]
    fn test_touch_slides_expiry() {
        let store = SessionStore::with_default_ttl(Duration::seconds(60));
        let created = store.create_at("player", None, t0()).unwrap();

        let touched_at = t0() + Duration::seconds(50);
        let touched = store.get_at(&created.session_id, true, touched_at).unwrap();
        assert_eq!(touched.last_accessed_at, touched_at);
        assert_eq!(touched.expires_at, touched_at + Duration::seconds(60));

        // Past the original expiry but inside the extended window
        let later = t0() + Duration::seconds(100);
        assert!(store.get_at(&created.session_id, false, later).is_some());
    }

    #[test]
    fn test_touch_extends_by_store_default_not_creation_ttl() {
        let store = SessionStore::new();
        let created = store
            .create_at("player", Some(Duration::seconds(30)), t0())
            .unwrap();

        let touched_at = t0() + Duration::seconds(10);
        let touched = store.get_at(&created.session_id, true, touched_at).unwrap();

        assert_eq!(touched.expires_at, touched_at + DEFAULT_SESSION_TTL);
        assert_eq!(touched.ttl, DEFAULT_SESSION_TTL);
    }

    #[test]
    fn test_create_rejects_non_positive_ttl() {
        let store = SessionStore::new();

        for ttl in [Duration::seconds(-60), Duration::zero()] {
            assert!(matches!(
                store.create_at("player", Some(ttl), t0()),
                Err(PlatformError::Internal)
            ));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_rejects_unrepresentable_expiry() {
        let store = SessionStore::new();

        assert!(matches!(
            store.create_at("player", Some(Duration::MAX), t0()),
            Err(PlatformError::Internal)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_touch_with_unusable_default_keeps_current_window() {
        let created_with = SessionStore::new();
        let session = created_with.create_at("player", None, t0()).unwrap();

        // A store whose default cannot produce a valid window
        for default_ttl in [Duration::seconds(-5), Duration::MAX] {
            let store = SessionStore::with_default_ttl(default_ttl);
            store
                .sessions
                .insert(session.session_id.clone(), Arc::clone(&session));

            let later = t0() + Duration::minutes(1);
            let fetched = store.get_at(&session.session_id, true, later).unwrap();
            assert_eq!(fetched.expires_at, session.expires_at);
            assert!(fetched.last_accessed_at <= fetched.expires_at);
        }
    }

    #[test]
    fn test_sliding_expiry_boundary() {
        let ttl = Duration::seconds(60);
        let store = SessionStore::with_default_ttl(ttl);
        let created = store
            .create_at("player", Some(Duration::seconds(15)), t0())
            .unwrap();
        let id = created.session_id.clone();

        let touched = t0() + Duration::seconds(10);
        store.get_at(&id, true, touched).unwrap();

        let just_before = touched + ttl - Duration::milliseconds(1);
        assert!(store.get_at(&id, false, just_before).is_some());

        let just_after = touched + ttl + Duration::milliseconds(1);
        assert!(store.get_at(&id, false, just_after).is_none());
    }

    #[test]
    fn test_expired_session_is_evicted() {
        let store = SessionStore::new();
        let created = store
            .create_at("player", Some(Duration::seconds(1)), t0())
            .unwrap();

        let after = t0() + Duration::seconds(2);
        assert!(store.get_at(&created.session_id, true, after).is_none());
        assert!(store.is_empty());

        // Eviction is permanent even if the clock is rewound
        assert!(store.get_at(&created.session_id, false, t0()).is_none());
    }

    #[test]
    fn test_touch_does_not_revive_expired_session() {
        let store = SessionStore::new();
        let created = store
            .create_at("player", Some(Duration::seconds(1)), t0())
            .unwrap();

        let after = t0() + Duration::seconds(5);
        assert!(store.get_at(&created.session_id, true, after).is_none());
    }

    #[test]
    fn test_touch_replaces_snapshot() {
        let store = SessionStore::new();
        let created = store.create_at("player", None, t0()).unwrap();

        let touched = store
            .get_at(&created.session_id, true, t0() + Duration::minutes(1))
            .unwrap();

        // Readers holding the old snapshot keep seeing it unchanged
        assert_eq!(created.last_accessed_at, t0());
        assert!(!Arc::ptr_eq(&created, &touched));
        assert!(touched.last_accessed_at <= touched.expires_at);
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let store = SessionStore::new();
        let created = store.create("player", None).unwrap();

        assert!(store.invalidate(&created.session_id));
        assert!(!store.invalidate(&created.session_id));
        assert!(!store.invalidate("never-existed"));
        assert!(store.get(&created.session_id, false).is_none());
    }

    #[test]
    fn test_purge_expired() {
        let store = SessionStore::new();
        store
            .create_at("short", Some(Duration::seconds(10)), t0())
            .unwrap();
        store
            .create_at("short-too", Some(Duration::seconds(20)), t0())
            .unwrap();
        let long = store
            .create_at("long", Some(Duration::minutes(10)), t0())
            .unwrap();

        let purged = store.purge_expired_at(t0() + Duration::seconds(30));
        assert_eq!(purged, 2);
        assert_eq!(store.len(), 1);
        assert!(store
            .get_at(&long.session_id, false, t0() + Duration::seconds(30))
            .is_some());
    }

    #[test]
    fn test_debug_redacts_identity_and_id() {
        let store = SessionStore::new();
        let session = store.create("alice@example.com", None).unwrap();
        let debug = format!("{session:?}");

        assert!(!debug.contains("alice@example.com"));
        assert!(!debug.contains(&session.session_id));
    }

    #[test]
    fn test_concurrent_touch_and_invalidate() {
        let store = Arc::new(SessionStore::new());
        let created = store.create("player", None).unwrap();
        let id = created.session_id.clone();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = id.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        if i == 0 {
                            store.invalidate(&id);
                        } else if let Some(session) = store.get(&id, true) {
                            assert_eq!(session.identity, "player");
                            assert!(session.last_accessed_at <= session.expires_at);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(store.get(&id, false).is_none());
    }
}
