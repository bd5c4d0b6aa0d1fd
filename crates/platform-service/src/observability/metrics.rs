//! Metrics definitions for the Game Platform.
//!
//! All metrics follow Prometheus naming conventions:
//! - `platform_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `status`: 2 values (success, error)
//! - `event`: 4 values (created, invalidated, expired, purged)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // RS256 signing sits in the low milliseconds
        .set_buckets_for_metric(
            Matcher::Prefix("platform_token_issuance".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500,
            ],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record token issuance duration and outcome
///
/// Metric: `platform_token_issuance_total`, `platform_token_issuance_duration_seconds`
/// Labels: `status`
pub fn record_token_issuance(status: &str, duration: Duration) {
    histogram!("platform_token_issuance_duration_seconds", "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("platform_token_issuance_total", "status" => status.to_string()).increment(1);
}

/// Record a key-set document request
///
/// Metric: `platform_jwks_requests_total`
pub fn record_jwks_request() {
    counter!("platform_jwks_requests_total").increment(1);
}

// ============================================================================
// Session Metrics
// ============================================================================

/// Record a session lifecycle event
///
/// Metric: `platform_sessions_total`
/// Labels: `event`
pub fn record_session_event(event: &str) {
    counter!("platform_sessions_total", "event" => event.to_string()).increment(1);
}

/// Record sessions removed by a sweep
///
/// Metric: `platform_sessions_total{event="purged"}`
pub fn record_sessions_purged(count: usize) {
    counter!("platform_sessions_total", "event" => "purged").increment(count as u64);
}

/// Record a login attempt outcome
///
/// Metric: `platform_logins_total`
/// Labels: `status`
pub fn record_login(status: &str) {
    counter!("platform_logins_total", "status" => status.to_string()).increment(1);
}
