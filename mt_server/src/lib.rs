//! Internal modules for the maintenance tracking server.
//!
//! This library exposes the router, configuration, logging, and metrics
//! used by the mt_server binary, so integration tests can drive the HTTP
//! surface directly.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
