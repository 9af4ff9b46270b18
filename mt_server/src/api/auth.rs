//! Authentication API handlers.
//!
//! Thin HTTP adapters over the session service: they extract tokens and
//! origin, call the service, and map its error kinds to status codes at
//! this boundary only. Credential and token failures are answered with a
//! uniform body so a caller cannot probe which sub-check failed.
//!
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"principal": "alice", "secret": "Correct-Horse-9"}'
//! ```

use axum::{
    Json,
    extract::{Extension, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use maintrack::auth::{AuthError, Role};
use serde::{Deserialize, Serialize};

use super::{AppState, ErrorBody, bearer_token, client_origin};
use crate::logging::log_security_event;
use crate::metrics;

use super::middleware::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub principal: String,
    pub secret: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct LogoutPayload {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked_count: u32,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub role: Role,
}

/// Map a session service error onto the wire.
///
/// The uniform 401 carries a `WWW-Authenticate` challenge; 429 carries the
/// retry-after hint in the body; store outages surface as a generic 503.
fn auth_error_response(err: &AuthError) -> Response {
    let body = ErrorBody {
        error: err.client_message(),
        retry_after: match err {
            AuthError::TooManyAttempts { retry_after, .. } => Some(*retry_after),
            _ => None,
        },
    };

    match err {
        AuthError::TooManyAttempts { .. } => {
            (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
        }
        AuthError::InvalidCredentials
        | AuthError::Token(_)
        | AuthError::WrongTokenType
        | AuthError::TokenRevoked => (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            Json(body),
        )
            .into_response(),
        AuthError::MissingToken => (StatusCode::BAD_REQUEST, Json(body)).into_response(),
        AuthError::Store(e) => {
            tracing::error!(error = %e, "store unavailable during auth operation");
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
        AuthError::Database(_) | AuthError::HashingFailed => {
            tracing::error!(error = %err, "internal auth failure");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// Authenticate a principal and return a fresh token pair.
///
/// # Response
///
/// `200 OK` with `{access_token, refresh_token, token_type, expires_in}`.
///
/// # Errors
///
/// - `401 Unauthorized`: invalid credentials (uniform, never says which check failed)
/// - `429 Too Many Requests`: principal or origin locked out; body carries `retry_after` seconds
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginPayload>,
) -> Response {
    let origin = client_origin(&headers);

    match state
        .sessions
        .login(&payload.principal, &payload.secret, &origin)
        .await
    {
        Ok(pair) => {
            metrics::login_attempts_total(true);
            metrics::token_pairs_issued_total("login");
            Json(pair).into_response()
        }
        Err(err) => {
            metrics::login_attempts_total(false);
            if let AuthError::TooManyAttempts { scope, .. } = &err {
                metrics::login_lockouts_total(scope.as_str());
                log_security_event(
                    "login_locked",
                    Some(&payload.principal),
                    Some(&origin),
                    "Login blocked by active lockout",
                );
            } else {
                log_security_event(
                    "login_failed",
                    Some(&payload.principal),
                    Some(&origin),
                    "Login attempt failed",
                );
            }
            auth_error_response(&err)
        }
    }
}

/// Exchange a refresh token (bearer) for a new rotated pair.
///
/// # Errors
///
/// - `401 Unauthorized`: missing bearer, invalid, expired, revoked, or wrong-type token
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return auth_error_response(&AuthError::Token(
            maintrack::auth::TokenError::Malformed("missing bearer token".to_string()),
        ));
    };

    match state.sessions.refresh(token).await {
        Ok(pair) => {
            metrics::token_pairs_issued_total("refresh");
            Json(pair).into_response()
        }
        Err(err) => {
            log_security_event(
                "refresh_failed",
                None,
                Some(&client_origin(&headers)),
                "Refresh token rejected",
            );
            auth_error_response(&err)
        }
    }
}

/// Revoke the presented access token and, optionally, a refresh token from
/// the body.
///
/// An expired access token is still accepted here: its id is recovered
/// without signature-level trust, purely so it can be revoked.
///
/// # Errors
///
/// - `400 Bad Request`: neither token supplied
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    // The body is optional; an empty one means "access token only".
    let payload: LogoutPayload = if body.is_empty() {
        LogoutPayload::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody::new("Invalid request body")),
                )
                    .into_response();
            }
        }
    };

    let access_token = bearer_token(&headers);
    let refresh_token = payload.refresh_token.as_deref();

    match state.sessions.logout(access_token, refresh_token).await {
        Ok(revoked_count) => {
            metrics::tokens_revoked_total(u64::from(revoked_count));
            Json(LogoutResponse { revoked_count }).into_response()
        }
        Err(err) => auth_error_response(&err),
    }
}

/// Identity echo for the authenticated caller.
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse {
        id: user.id,
        role: user.role,
    })
}
