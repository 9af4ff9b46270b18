//! HTTP API for the maintenance tracking server.
//!
//! # Architecture
//!
//! - **Axum**: async web framework, middleware via `from_fn_with_state`
//! - **JWT**: bearer authentication with access/refresh token rotation
//! - **Shared TTL store**: revocation, lockout, and dedup state
//!
//! # Modules
//!
//! - [`auth`]: login, refresh, logout, and identity echo handlers
//! - [`movements`]: NFC-triggered movement endpoints behind the guard chain
//! - [`middleware`]: bearer-token authentication middleware
//! - [`request_id`]: request id propagation and per-request logging
//!
//! # Endpoints
//!
//! ```text
//! GET  /health                          - Health check (public)
//! POST /api/v1/auth/login               - Login (public)
//! POST /api/v1/auth/refresh             - Rotate tokens (bearer = refresh token)
//! POST /api/v1/auth/logout              - Revoke tokens (bearer = access token)
//! GET  /api/v1/auth/me                  - Identity echo (auth required)
//! POST /api/v1/movements/retire/nfc     - Retire equipment by NFC tag (auth + guards)
//! POST /api/v1/movements/return/nfc     - Return equipment by NFC tag (auth + guards)
//! ```

pub mod auth;
pub mod middleware;
pub mod movements;
pub mod request_id;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use maintrack::auth::{SessionService, TokenCodec};
use maintrack::db::repository::{MovementRepository, UserRepository};
use maintrack::guard::{DedupGuard, RevocationLedger};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::config::GuardSettings;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is either an `Arc` or a small value.
/// Nothing here is mutable: all shared state lives in the injected store
/// and database behind the components.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub codec: Arc<TokenCodec>,
    pub users: Arc<dyn UserRepository>,
    pub movements: Arc<dyn MovementRepository>,
    pub revocations: Arc<RevocationLedger>,
    pub dedup: Arc<DedupGuard>,
    pub guards: GuardSettings,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            retry_after: None,
        }
    }
}

/// Extract the bearer token from an Authorization header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Best-effort client origin for lockout accounting.
///
/// Prefers the proxy-supplied headers; a request with neither is still
/// accounted for under a shared bucket rather than skipped.
pub(crate) fn client_origin(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Versioned routes: token endpoints handle bearer extraction themselves
/// (logout must accept an expired access token), everything else sits
/// behind the authentication middleware.
fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/movements/retire/nfc", post(movements::retire_by_nfc))
        .route("/movements/return/nfc", post(movements::return_by_nfc))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Probes database connectivity; returns `503` when the probe fails so a
/// balancer can drain the instance.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = state.users.ping().await.is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
