//! Authentication middleware for protected endpoints.
//!
//! Validates the bearer access token on every request: decode with a small
//! clock leeway, strict type check, then the revocation ledger. The
//! revocation check fails closed; letting a revoked token through is worse
//! than rejecting requests while the store is down.
//!
//! On success a [`CurrentUser`] is attached to the request extensions:
//!
//! ```rust,no_run
//! use axum::{Json, extract::Extension};
//! use mt_server::api::middleware::CurrentUser;
//!
//! async fn handler(Extension(user): Extension<CurrentUser>) -> Json<i64> {
//!     Json(user.id)
//! }
//! # let _ = handler;
//! ```

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use maintrack::auth::{Claims, Role, TokenType};

use super::{AppState, ErrorBody, bearer_token};
use crate::metrics;

/// Clock tolerance when validating access tokens.
const ACCESS_LEEWAY_SECS: u64 = 30;

/// Authenticated identity attached to the request by the middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

impl CurrentUser {
    fn from_claims(claims: &Claims) -> Option<Self> {
        claims.sub.parse().ok().map(|id| Self {
            id,
            role: claims.role,
        })
    }

    /// Check the caller's role against an allow list.
    ///
    /// Admin always passes. Returns the ready-made `403` response on
    /// mismatch so handlers can bail with `?`-like brevity.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), Response> {
        if self.role == Role::Admin || allowed.contains(&self.role) {
            Ok(())
        } else {
            Err((
                StatusCode::FORBIDDEN,
                Json(ErrorBody::new("Not authorized")),
            )
                .into_response())
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(ErrorBody::new("Not authenticated")),
    )
        .into_response()
}

/// Validate the bearer access token and inject [`CurrentUser`].
///
/// Every failure mode answers with the same `401`; the distinct reasons go
/// to metrics and logs only.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        metrics::token_rejections_total("missing");
        return unauthorized();
    };

    let claims = match state.codec.decode(token, ACCESS_LEEWAY_SECS) {
        Ok(claims) => claims,
        Err(err) => {
            metrics::token_rejections_total("decode");
            tracing::debug!(error = %err, "access token rejected");
            return unauthorized();
        }
    };

    if !claims.matches_type(TokenType::Access) {
        metrics::token_rejections_total("wrong_type");
        return unauthorized();
    }

    match state.revocations.is_revoked(&claims.jti).await {
        Ok(false) => {}
        Ok(true) => {
            metrics::token_rejections_total("revoked");
            return unauthorized();
        }
        Err(err) => {
            // Fail closed: a revoked token must not slip through a store
            // outage on the strength of its signature alone.
            tracing::error!(error = %err, "revocation check unavailable, rejecting request");
            metrics::token_rejections_total("store_unavailable");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody::new("Service temporarily unavailable")),
            )
                .into_response();
        }
    }

    let Some(user) = CurrentUser::from_claims(&claims) else {
        metrics::token_rejections_total("bad_subject");
        return unauthorized();
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Variant of [`auth_middleware`] that also loads the live user record and
/// rejects inactive accounts.
///
/// Costs a database read per request; use only where a fresh
/// active/disabled check matters more than latency.
pub async fn auth_middleware_live(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        metrics::token_rejections_total("missing");
        return unauthorized();
    };

    let claims = match state.codec.decode(token, ACCESS_LEEWAY_SECS) {
        Ok(claims) => claims,
        Err(_) => {
            metrics::token_rejections_total("decode");
            return unauthorized();
        }
    };

    if !claims.matches_type(TokenType::Access) {
        metrics::token_rejections_total("wrong_type");
        return unauthorized();
    }

    match state.revocations.is_revoked(&claims.jti).await {
        Ok(false) => {}
        Ok(true) => {
            metrics::token_rejections_total("revoked");
            return unauthorized();
        }
        Err(err) => {
            tracing::error!(error = %err, "revocation check unavailable, rejecting request");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody::new("Service temporarily unavailable")),
            )
                .into_response();
        }
    }

    let Some(user) = CurrentUser::from_claims(&claims) else {
        metrics::token_rejections_total("bad_subject");
        return unauthorized();
    };

    match state.users.find_by_id(user.id).await {
        Ok(Some(record)) if record.is_active => {}
        Ok(_) => {
            metrics::token_rejections_total("inactive");
            return unauthorized();
        }
        Err(err) => {
            tracing::error!(error = %err, "user lookup failed in live auth check");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("Internal server error")),
            )
                .into_response();
        }
    }

    request.extensions_mut().insert(user);
    next.run(request).await
}
