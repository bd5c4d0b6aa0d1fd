//! Metrics definitions for the Game Provider.
//!
//! All metrics follow Prometheus naming conventions:
//! - `provider_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `status`: 2 values (success, error)
//! - `error_code`: 8 values (the validation error codes plus `none`)
//! - `result`: 2 values (hit, miss)

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
        // Cache hits are sub-millisecond; misses include a network round trip
        .set_buckets_for_metric(
            Matcher::Prefix("provider_token_validation".to_string()),
            &[
                0.0005, 0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set token validation buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Validation Metrics
// ============================================================================

/// Record a validation verdict
///
/// Metric: `provider_token_validations_total`, `provider_token_validation_duration_seconds`
/// Labels: `status`, `error_code`
pub fn record_token_validation(status: &str, error_code: Option<&str>, duration: Duration) {
    let error_code = error_code.unwrap_or("none");

    histogram!("provider_token_validation_duration_seconds", "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("provider_token_validations_total",
        "status" => status.to_string(),
        "error_code" => error_code.to_string()
    )
    .increment(1);
}

// ============================================================================
// Key-set Metrics
// ============================================================================

/// Record a key-set network fetch
///
/// Metric: `provider_jwks_fetch_total`
/// Labels: `status`
pub fn record_jwks_fetch(status: &str) {
    counter!("provider_jwks_fetch_total", "status" => status.to_string()).increment(1);
}

/// Record a key-set cache lookup
///
/// Metric: `provider_jwks_cache_total`
/// Labels: `result` (hit, miss)
pub fn record_jwks_cache(result: &str) {
    counter!("provider_jwks_cache_total", "result" => result.to_string()).increment(1);
}

/// Record use of the first-key fallback when no key matched `kid`
///
/// Metric: `provider_jwks_key_fallback_total`
pub fn record_key_fallback() {
    counter!("provider_jwks_key_fallback_total").increment(1);
}
