//! Expired-session sweeper.
//!
//! Lookups already evict expired sessions lazily. This task reclaims the
//! ones that are never looked up again (players who simply walk away).
//!
//! # Graceful Shutdown
//!
//! The task exits when the cancellation token is triggered.

use crate::services::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default sweep interval in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Run the sweeper loop until `cancel_token` fires.
pub async fn start_session_sweeper(
    sessions: Arc<SessionStore>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);

    info!(target: "platform.tasks.sweeper", interval_secs = interval.as_secs(), "Session sweeper started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let purged = sessions.purge_expired();
                if purged > 0 {
                    debug!(
                        target: "platform.tasks.sweeper",
                        purged = purged,
                        remaining = sessions.len(),
                        "Purged expired sessions"
                    );
                }
            }
            _ = cancel_token.cancelled() => {
                info!(target: "platform.tasks.sweeper", "Session sweeper received shutdown signal, exiting");
                break;
            }
        }
    }
}
