//! NFC-triggered movement endpoints.
//!
//! A badge tap is hardware-triggered and retries aggressively, so these
//! handlers run the full guard chain before touching the database:
//!
//! 1. idempotency key from the request header (`409` on a duplicate)
//! 2. debounce on (actor, tag, action) against double taps (`429`)
//! 3. rate window on (actor, tag) against runaway readers (`429`)
//!
//! The guards are defense in depth; when the shared store is down they
//! allow the request through and say so in logs and metrics.

use axum::{
    Json,
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use maintrack::auth::Role;
use maintrack::db::repository::NewMovement;
use maintrack::guard::GuardOutcome;
use serde::Deserialize;

use super::middleware::CurrentUser;
use super::{AppState, ErrorBody};
use crate::metrics;

/// Header carrying the client-supplied idempotency token.
pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

#[derive(Debug, Deserialize)]
pub struct NfcMovementPayload {
    pub nfc_tag: String,
    pub to_location_id: i64,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum MovementAction {
    Retire,
    Return,
}

impl MovementAction {
    fn as_str(self) -> &'static str {
        match self {
            MovementAction::Retire => "retire",
            MovementAction::Return => "return",
        }
    }
}

/// Retire equipment from its current location, identified by NFC tag.
pub async fn retire_by_nfc(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    Json(payload): Json<NfcMovementPayload>,
) -> Response {
    move_by_nfc(state, user, headers, payload, MovementAction::Retire).await
}

/// Return equipment to a location, identified by NFC tag.
pub async fn return_by_nfc(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    Json(payload): Json<NfcMovementPayload>,
) -> Response {
    move_by_nfc(state, user, headers, payload, MovementAction::Return).await
}

async fn move_by_nfc(
    state: AppState,
    user: CurrentUser,
    headers: HeaderMap,
    payload: NfcMovementPayload,
    action: MovementAction,
) -> Response {
    if let Err(forbidden) = user.require_role(&[Role::Operator, Role::Supervisor]) {
        return forbidden;
    }

    let Some(idempotency_key) = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Missing idempotency key")),
        )
            .into_response();
    };

    match state
        .dedup
        .check_idempotent(idempotency_key, state.guards.idempotency_ttl())
        .await
    {
        GuardOutcome::Rejected => {
            metrics::guard_rejections_total("idempotency");
            return (
                StatusCode::CONFLICT,
                Json(ErrorBody::new("Duplicate request")),
            )
                .into_response();
        }
        GuardOutcome::AllowedDegraded => metrics::guard_degraded_total("idempotency"),
        GuardOutcome::Allowed => {}
    }

    let tag = payload.nfc_tag.trim().to_lowercase();

    let debounce_key = format!("nfc:{}:{}:{}", user.id, tag, action.as_str());
    match state
        .dedup
        .check_debounce(&debounce_key, state.guards.debounce_ttl())
        .await
    {
        GuardOutcome::Rejected => {
            metrics::guard_rejections_total("debounce");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorBody::new("Repeated too quickly")),
            )
                .into_response();
        }
        GuardOutcome::AllowedDegraded => metrics::guard_degraded_total("debounce"),
        GuardOutcome::Allowed => {}
    }

    let rate_key = format!("nfc:{}:{}", user.id, tag);
    match state
        .dedup
        .check_rate_window(
            &rate_key,
            state.guards.nfc_rate_limit,
            state.guards.nfc_rate_window(),
        )
        .await
    {
        GuardOutcome::Rejected => {
            metrics::guard_rejections_total("rate");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorBody::new("Too many requests")),
            )
                .into_response();
        }
        GuardOutcome::AllowedDegraded => metrics::guard_degraded_total("rate"),
        GuardOutcome::Allowed => {}
    }

    let equipment = match state.movements.find_equipment_by_tag(&tag).await {
        Ok(Some(equipment)) => equipment,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorBody::new("No equipment with that NFC tag")),
            )
                .into_response();
        }
        Err(err) => {
            tracing::error!(error = %err, "equipment lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("Internal server error")),
            )
                .into_response();
        }
    };

    let movement = NewMovement {
        equipment_id: equipment.id,
        from_location_id: equipment.location_id,
        to_location_id: payload.to_location_id,
        comment: payload.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        actor_id: user.id,
    };

    match state.movements.record_movement(movement).await {
        Ok(record) => {
            tracing::info!(
                movement_id = record.id,
                equipment_id = record.equipment_id,
                actor_id = record.actor_id,
                action = action.as_str(),
                "equipment movement recorded"
            );
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "movement insert failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("Internal server error")),
            )
                .into_response()
        }
    }
}
