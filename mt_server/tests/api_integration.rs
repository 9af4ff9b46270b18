//! Integration tests for the HTTP API.
//!
//! Drives the router directly with `tower::ServiceExt::oneshot` against
//! repository doubles and the in-memory store, covering the login/refresh/
//! logout protocol, lockout, and the NFC guard chain end to end.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Extension;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use maintrack::auth::errors::AuthResult;
use maintrack::auth::models::{Role, User};
use maintrack::auth::{CredentialStore, SessionService, SigningAlgorithm, TokenCodec};
use maintrack::db::repository::{
    Equipment, MovementRecord, MovementRepository, MovementResult, NewMovement, UserRepository,
};
use maintrack::guard::lockout::{LockoutConfig, LockoutGuard, LockoutPolicy};
use maintrack::guard::{DedupGuard, RevocationLedger};
use maintrack::store::{MemoryStore, StoreError, StoreResult, TtlStore};
use mt_server::api::middleware::CurrentUser;
use mt_server::api::movements::IDEMPOTENCY_HEADER;
use mt_server::api::{AppState, create_router};
use mt_server::config::GuardSettings;
use tokio::sync::Mutex;
use tower::ServiceExt; // For `oneshot` method

const SECRET: &str = "api-test-secret-key-0123456789abcdef";
const PEPPER: &str = "api-test-pepper-value";
const PASSWORD: &str = "Correct-Horse-9";

struct MockUserRepository {
    users: Vec<User>,
    healthy: bool,
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_principal(&self, principal: &str) -> AuthResult<Option<User>> {
        let key = principal.trim();
        Ok(self
            .users
            .iter()
            .find(|u| {
                u.username.eq_ignore_ascii_case(key)
                    || u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(key))
            })
            .cloned())
    }

    async fn find_by_id(&self, user_id: i64) -> AuthResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn update_last_login(&self, _user_id: i64) -> AuthResult<()> {
        Ok(())
    }

    async fn ping(&self) -> AuthResult<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(StoreError::Unavailable("database down".to_string()).into())
        }
    }
}

struct MockMovementRepository {
    equipment: Vec<Equipment>,
    movements: Mutex<Vec<MovementRecord>>,
    next_id: AtomicI64,
}

impl MockMovementRepository {
    fn with_equipment(equipment: Vec<Equipment>) -> Arc<Self> {
        Arc::new(Self {
            equipment,
            movements: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        })
    }

    async fn recorded_count(&self) -> usize {
        self.movements.lock().await.len()
    }
}

#[async_trait]
impl MovementRepository for MockMovementRepository {
    async fn find_equipment_by_tag(&self, nfc_tag: &str) -> MovementResult<Option<Equipment>> {
        Ok(self
            .equipment
            .iter()
            .find(|e| e.nfc_tag.eq_ignore_ascii_case(nfc_tag.trim()))
            .cloned())
    }

    async fn record_movement(&self, movement: NewMovement) -> MovementResult<MovementRecord> {
        let record = MovementRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            equipment_id: movement.equipment_id,
            from_location_id: movement.from_location_id,
            to_location_id: movement.to_location_id,
            comment: movement.comment,
            actor_id: movement.actor_id,
            recorded_at: Utc::now(),
        };
        self.movements.lock().await.push(record.clone());
        Ok(record)
    }
}

fn test_user(id: i64, username: &str, role: Role) -> User {
    let credentials = CredentialStore::new(PEPPER.to_string());
    User {
        id,
        username: username.to_string(),
        email: Some(format!("{username}@example.com")),
        password_hash: credentials.hash_secret(PASSWORD).unwrap(),
        role,
        is_active: true,
        created_at: Utc::now(),
        last_login: None,
    }
}

fn default_guards() -> GuardSettings {
    GuardSettings {
        idempotency_ttl_secs: 30,
        debounce_ttl_secs: 3,
        nfc_rate_limit: 5,
        nfc_rate_window_secs: 10,
        store_op_timeout_ms: 500,
    }
}

fn build_state(
    store: Arc<dyn TtlStore>,
    principal_threshold: u32,
    guards: GuardSettings,
) -> (AppState, Arc<MockMovementRepository>) {
    let users: Arc<dyn UserRepository> = Arc::new(MockUserRepository {
        users: vec![
            test_user(1, "alice", Role::Operator),
            test_user(2, "root", Role::Admin),
        ],
        healthy: true,
    });

    let movements = MockMovementRepository::with_equipment(vec![Equipment {
        id: 10,
        nfc_tag: "tag-0001".to_string(),
        location_id: Some(5),
    }]);

    let op_timeout = guards.op_timeout();
    let codec = Arc::new(TokenCodec::new(SECRET, SigningAlgorithm::Hs256, None, None));
    let revocations = Arc::new(RevocationLedger::new(store.clone(), op_timeout));
    let dedup = Arc::new(DedupGuard::new(store.clone(), op_timeout));
    let lockout = Arc::new(LockoutGuard::new(
        store,
        LockoutConfig {
            principal: LockoutPolicy {
                max_fails: principal_threshold,
                window: StdDuration::from_secs(900),
                lockout: StdDuration::from_secs(900),
            },
            origin: LockoutPolicy {
                max_fails: principal_threshold * 10,
                window: StdDuration::from_secs(900),
                lockout: StdDuration::from_secs(900),
            },
        },
        op_timeout,
    ));

    let sessions = Arc::new(SessionService::new(
        users.clone(),
        CredentialStore::new(PEPPER.to_string()),
        codec.clone(),
        revocations.clone(),
        lockout,
        Duration::minutes(10),
        Duration::days(7),
    ));

    let state = AppState {
        sessions,
        codec,
        users,
        movements: movements.clone(),
        revocations,
        dedup,
        guards,
    };
    (state, movements)
}

fn test_app() -> (Router, Arc<MockMovementRepository>) {
    let (state, movements) = build_state(Arc::new(MemoryStore::new()), 8, default_guards());
    (create_router(state), movements)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router, principal: &str, secret: &str, ip: &str) -> Response {
    let mut request = json_request(
        "POST",
        "/api/v1/auth/login",
        serde_json::json!({"principal": principal, "secret": secret}),
    );
    request
        .headers_mut()
        .insert("x-forwarded-for", ip.parse().unwrap());
    app.clone().oneshot(request).await.unwrap()
}

async fn login_tokens(app: &Router, principal: &str) -> (String, String) {
    let response = login(app, principal, PASSWORD, "1.2.3.4").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

fn nfc_request(uri: &str, access_token: &str, idempotency_key: Option<&str>) -> Request<Body> {
    let mut request = json_request(
        "POST",
        uri,
        serde_json::json!({"nfc_tag": "TAG-0001", "to_location_id": 9}),
    );
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {access_token}").parse().unwrap(),
    );
    if let Some(key) = idempotency_key {
        request
            .headers_mut()
            .insert(IDEMPOTENCY_HEADER, key.parse().unwrap());
    }
    request
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_health_check_reports_db_outage() {
    let (mut state, _) = build_state(Arc::new(MemoryStore::new()), 8, default_guards());
    state.users = Arc::new(MockUserRepository {
        users: vec![],
        healthy: false,
    });
    let app = create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_login_me_logout_flow() {
    let (app, _) = test_app();

    let response = login(&app, "alice", PASSWORD, "1.2.3.4").await;
    assert_eq!(response.status(), StatusCode::OK);
    let tokens = body_json(response).await;
    assert_eq!(tokens["token_type"], "bearer");
    assert!(tokens["expires_in"].as_i64().unwrap() > 0);
    let access = tokens["access_token"].as_str().unwrap();
    let refresh = tokens["refresh_token"].as_str().unwrap();

    // Access token authenticates a protected request.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["id"], 1);
    assert_eq!(me["role"], "OPERATOR");

    // Logout revokes both tokens.
    let mut request = json_request(
        "POST",
        "/api/v1/auth/logout",
        serde_json::json!({"refresh_token": refresh}),
    );
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {access}").parse().unwrap(),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["revoked_count"], 2);

    // The revoked access token no longer authenticates.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let (app, _) = test_app();

    let wrong_secret = login(&app, "alice", "bad-password", "1.2.3.4").await;
    assert_eq!(wrong_secret.status(), StatusCode::UNAUTHORIZED);
    let wrong_body = body_json(wrong_secret).await;

    let unknown_user = login(&app, "nobody", PASSWORD, "1.2.3.4").await;
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    let unknown_body = body_json(unknown_user).await;

    assert_eq!(wrong_body["error"], unknown_body["error"]);
}

#[tokio::test]
async fn test_lockout_after_repeated_failures() {
    let (state, _) = build_state(Arc::new(MemoryStore::new()), 8, default_guards());
    let app = create_router(state);

    for _ in 0..8 {
        let response = login(&app, "alice", "bad-password", "1.2.3.4").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Ninth attempt hits the lock, with a positive retry hint.
    let response = login(&app, "alice", "bad-password", "1.2.3.4").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert!(body["retry_after"].as_u64().unwrap() > 0);

    // The principal lock holds even with correct credentials from a
    // different address.
    let response = login(&app, "alice", PASSWORD, "9.9.9.9").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_refresh_rotation() {
    let (app, _) = test_app();
    let (_, refresh) = login_tokens(&app, "alice").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/refresh")
                .header(header::AUTHORIZATION, format!("Bearer {refresh}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert_ne!(rotated["refresh_token"].as_str().unwrap(), refresh);

    // The redeemed refresh token is single-use.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/refresh")
                .header(header::AUTHORIZATION, format!("Bearer {refresh}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rejects_access_token_and_missing_bearer() {
    let (app, _) = test_app();
    let (access, _) = login_tokens(&app, "alice").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/refresh")
                .header(header::AUTHORIZATION, format!("Bearer {access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_with_nothing_to_revoke() {
    let (app, _) = test_app();
    let response = app
        .oneshot(json_request("POST", "/api/v1/auth/logout", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_route_requires_valid_token() {
    let (app, _) = test_app();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/v1/auth/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/me")
                .header(header::AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_nfc_retire_idempotency() {
    let (app, movements) = test_app();
    let (access, _) = login_tokens(&app, "alice").await;

    let response = app
        .clone()
        .oneshot(nfc_request("/api/v1/movements/retire/nfc", &access, Some("op-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let movement = body_json(response).await;
    assert_eq!(movement["equipment_id"], 10);
    assert_eq!(movement["to_location_id"], 9);
    assert_eq!(movement["from_location_id"], 5);

    // Same idempotency key within the window: rejected, no second write.
    let response = app
        .clone()
        .oneshot(nfc_request("/api/v1/movements/retire/nfc", &access, Some("op-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    assert_eq!(movements.recorded_count().await, 1);
}

#[tokio::test]
async fn test_nfc_requires_idempotency_key() {
    let (app, movements) = test_app();
    let (access, _) = login_tokens(&app, "alice").await;

    let response = app
        .clone()
        .oneshot(nfc_request("/api/v1/movements/retire/nfc", &access, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(movements.recorded_count().await, 0);
}

#[tokio::test]
async fn test_nfc_unknown_tag() {
    let (app, _) = test_app();
    let (access, _) = login_tokens(&app, "alice").await;

    let mut request = json_request(
        "POST",
        "/api/v1/movements/return/nfc",
        serde_json::json!({"nfc_tag": "no-such-tag", "to_location_id": 9}),
    );
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {access}").parse().unwrap(),
    );
    request
        .headers_mut()
        .insert(IDEMPOTENCY_HEADER, "op-404".parse().unwrap());

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_nfc_debounce_rejects_rapid_repeat() {
    let (app, movements) = test_app();
    let (access, _) = login_tokens(&app, "alice").await;

    let response = app
        .clone()
        .oneshot(nfc_request("/api/v1/movements/retire/nfc", &access, Some("op-a")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Fresh idempotency key, but the same badge tap seconds later.
    let response = app
        .clone()
        .oneshot(nfc_request("/api/v1/movements/retire/nfc", &access, Some("op-b")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    assert_eq!(movements.recorded_count().await, 1);
}

#[tokio::test]
async fn test_nfc_rate_window_limits_repeats() {
    // Debounce disabled so the window limiter is what trips.
    let guards = GuardSettings {
        debounce_ttl_secs: 0,
        nfc_rate_limit: 2,
        ..default_guards()
    };
    let (state, movements) = build_state(Arc::new(MemoryStore::new()), 8, guards);
    let app = create_router(state);
    let (access, _) = login_tokens(&app, "alice").await;

    for key in ["op-1", "op-2"] {
        let response = app
            .clone()
            .oneshot(nfc_request("/api/v1/movements/retire/nfc", &access, Some(key)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(nfc_request("/api/v1/movements/retire/nfc", &access, Some("op-3")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(movements.recorded_count().await, 2);
}

#[tokio::test]
async fn test_role_gate_returns_403() {
    let (state, _) = build_state(Arc::new(MemoryStore::new()), 8, default_guards());

    async fn supervisors_only(Extension(user): Extension<CurrentUser>) -> Response {
        match user.require_role(&[Role::Supervisor]) {
            Ok(()) => StatusCode::OK.into_response(),
            Err(forbidden) => forbidden,
        }
    }

    let app = Router::new()
        .route("/supervisors-only", get(supervisors_only))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            mt_server::api::middleware::auth_middleware,
        ))
        .with_state(state.clone());
    let login_app = create_router(state);

    // Operator is not on the allow list.
    let (operator_access, _) = login_tokens(&login_app, "alice").await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/supervisors-only")
                .header(header::AUTHORIZATION, format!("Bearer {operator_access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin passes every role gate.
    let (admin_access, _) = login_tokens(&login_app, "root").await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/supervisors-only")
                .header(header::AUTHORIZATION, format!("Bearer {admin_access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_live_auth_check_rejects_inactive_account() {
    use maintrack::auth::TokenType;

    let (state, _) = build_state(Arc::new(MemoryStore::new()), 8, default_guards());
    let mut inactive = test_user(3, "mallory", Role::Operator);
    inactive.is_active = false;
    let state = AppState {
        users: Arc::new(MockUserRepository {
            users: vec![test_user(1, "alice", Role::Operator), inactive],
            healthy: true,
        }),
        ..state
    };

    async fn whoami(Extension(user): Extension<CurrentUser>) -> Response {
        user.id.to_string().into_response()
    }

    let app = Router::new()
        .route("/whoami", get(whoami))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            mt_server::api::middleware::auth_middleware_live,
        ))
        .with_state(state.clone());

    let token_for = |sub: &str| {
        state
            .codec
            .issue(sub, Role::Operator, TokenType::Access, Duration::minutes(10))
            .unwrap()
            .0
    };

    // Active account passes the live check.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header(header::AUTHORIZATION, format!("Bearer {}", token_for("1")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A valid token for a deactivated account is rejected.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header(header::AUTHORIZATION, format!("Bearer {}", token_for("3")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // So is a token whose subject has no record at all.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header(header::AUTHORIZATION, format!("Bearer {}", token_for("999")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_guard_fails_closed_on_store_outage() {
    /// Store double whose every operation fails.
    struct UnavailableStore;

    #[async_trait]
    impl TtlStore for UnavailableStore {
        async fn set_with_ttl(&self, _: &str, _: StdDuration) -> StoreResult<()> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn set_if_absent(&self, _: &str, _: StdDuration) -> StoreResult<bool> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn exists(&self, _: &str) -> StoreResult<bool> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn remaining_ttl(&self, _: &str) -> StoreResult<Option<StdDuration>> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn counter(&self, _: &str) -> StoreResult<i64> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn incr_refresh_ttl(&self, _: &str, _: StdDuration) -> StoreResult<i64> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn incr_keep_ttl(&self, _: &str, _: StdDuration) -> StoreResult<i64> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn remove(&self, _: &[String]) -> StoreResult<()> {
            Err(StoreError::Unavailable("down".to_string()))
        }
    }

    let (state, _) = build_state(Arc::new(UnavailableStore), 8, default_guards());
    let app = create_router(state);

    // Login still works: the lockout guard fails open and token issuance
    // does not touch the store.
    let (access, _) = login_tokens(&app, "alice").await;

    // The request guard's revocation check fails closed.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
