//! Structured logging configuration.
//!
//! Initializes the tracing subscriber and provides a helper for security
//! events, so lockouts, revocations, and degraded-store decisions share a
//! common shape in the logs.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging.
///
/// Log levels are configurable via the `RUST_LOG` env var; the default
/// keeps the crate at info while silencing chatty dependencies.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a security event with structured fields.
///
/// # Example
///
/// ```
/// use mt_server::logging::log_security_event;
///
/// log_security_event("login_failed", Some("alice"), Some("1.2.3.4"), "Invalid credentials");
/// ```
pub fn log_security_event(
    event_type: &str,
    principal: Option<&str>,
    origin: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event = event_type,
        principal = principal,
        origin = origin,
        "SECURITY: {}",
        message
    );
}
