//! Prometheus metrics for the auth and guard subsystems.
//!
//! Metrics are exposed on a separate listener in Prometheus text format.
//! Counters here cover the security-relevant paths: login outcomes,
//! lockouts, token validation failures, revocations, and the guard chain
//! in front of NFC-triggered mutations.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize the Prometheus exporter.
///
/// Metrics become scrapable at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record a completed HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment the login attempts counter.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment the lockout counter for a scope (`principal` or `origin`).
pub fn login_lockouts_total(scope: &str) {
    metrics::counter!("login_lockouts_total",
        "scope" => scope.to_string()
    )
    .increment(1);
}

/// Increment the issued token pairs counter for a flow (`login` or `refresh`).
pub fn token_pairs_issued_total(flow: &str) {
    metrics::counter!("token_pairs_issued_total",
        "flow" => flow.to_string()
    )
    .increment(1);
}

/// Increment the token rejection counter with the failure reason.
pub fn token_rejections_total(reason: &str) {
    metrics::counter!("token_rejections_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Count tokens revoked by logout.
pub fn tokens_revoked_total(count: u64) {
    metrics::counter!("tokens_revoked_total").increment(count);
}

// ============================================================================
// Guard Metrics
// ============================================================================

/// Increment the rejection counter for a guard (`idempotency`, `debounce`, `rate`).
pub fn guard_rejections_total(guard: &str) {
    metrics::counter!("guard_rejections_total",
        "guard" => guard.to_string()
    )
    .increment(1);
}

/// Increment the degraded-allow counter for a guard.
///
/// Fires when the shared store was unreachable and a defense-in-depth check
/// passed a request through.
pub fn guard_degraded_total(guard: &str) {
    metrics::counter!("guard_degraded_total",
        "guard" => guard.to_string()
    )
    .increment(1);
}
