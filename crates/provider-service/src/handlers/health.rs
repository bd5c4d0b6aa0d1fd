//! Liveness probe.

/// Returns "OK" while the process is serving requests.
pub async fn health_check() -> &'static str {
    "OK"
}
