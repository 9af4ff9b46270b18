//! Repository trait definitions for testability and dependency injection.
//!
//! Trait-based seams over the relational tables the auth subsystem touches.
//! The session service and HTTP layer only see these traits, so tests run
//! against in-memory doubles and the Postgres implementations stay thin.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};
use thiserror::Error;

use crate::auth::errors::AuthResult;
use crate::auth::models::{Role, User, UserId};

/// Trait for user account lookups used by authentication.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by username or email, case-insensitively.
    async fn find_by_principal(&self, principal: &str) -> AuthResult<Option<User>>;

    /// Find a user by id
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Stamp the user's last successful login
    async fn update_last_login(&self, user_id: UserId) -> AuthResult<()>;

    /// Verify the backing database answers at all (health probe)
    async fn ping(&self) -> AuthResult<()>;
}

/// Equipment record, looked up by its NFC tag.
#[derive(Debug, Clone)]
pub struct Equipment {
    pub id: i64,
    pub nfc_tag: String,
    pub location_id: Option<i64>,
}

/// A recorded equipment movement.
#[derive(Debug, Clone, Serialize)]
pub struct MovementRecord {
    pub id: i64,
    pub equipment_id: i64,
    pub from_location_id: Option<i64>,
    pub to_location_id: i64,
    pub comment: Option<String>,
    pub actor_id: UserId,
    pub recorded_at: DateTime<Utc>,
}

/// Input for recording a movement.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub equipment_id: i64,
    pub from_location_id: Option<i64>,
    pub to_location_id: i64,
    pub comment: Option<String>,
    pub actor_id: UserId,
}

/// Movement persistence errors
#[derive(Debug, Error)]
pub enum MovementError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type MovementResult<T> = Result<T, MovementError>;

/// Trait for the movement records written by NFC-triggered endpoints.
///
/// The business rules of equipment state live with the resource handlers;
/// this seam only covers tag lookup and the movement insert.
#[async_trait]
pub trait MovementRepository: Send + Sync {
    /// Find equipment by NFC tag, case-insensitively.
    async fn find_equipment_by_tag(&self, nfc_tag: &str) -> MovementResult<Option<Equipment>>;

    /// Insert a movement and update the equipment's current location, in
    /// one transaction.
    async fn record_movement(&self, movement: NewMovement) -> MovementResult<MovementRecord>;
}

/// Default PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: Role::parse(&row.get::<String, _>("role")).unwrap_or(Role::Operator),
        is_active: row.get("is_active"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        last_login: row
            .get::<Option<chrono::NaiveDateTime>, _>("last_login")
            .map(|dt| dt.and_utc()),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_principal(&self, principal: &str) -> AuthResult<Option<User>> {
        let key = principal.trim();
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, role, is_active, created_at, last_login
            FROM users
            WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)
            LIMIT 1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| user_from_row(&r)))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, role, is_active, created_at, last_login
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| user_from_row(&r)))
    }

    async fn update_last_login(&self, user_id: UserId) -> AuthResult<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> AuthResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Default PostgreSQL implementation of `MovementRepository`
pub struct PgMovementRepository {
    pool: PgPool,
}

impl PgMovementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovementRepository for PgMovementRepository {
    async fn find_equipment_by_tag(&self, nfc_tag: &str) -> MovementResult<Option<Equipment>> {
        let row = sqlx::query(
            "SELECT id, nfc_tag, location_id FROM equipment WHERE LOWER(nfc_tag) = LOWER($1)",
        )
        .bind(nfc_tag.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Equipment {
            id: r.get("id"),
            nfc_tag: r.get("nfc_tag"),
            location_id: r.get("location_id"),
        }))
    }

    async fn record_movement(&self, movement: NewMovement) -> MovementResult<MovementRecord> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO movements (equipment_id, from_location_id, to_location_id, comment, actor_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, recorded_at
            "#,
        )
        .bind(movement.equipment_id)
        .bind(movement.from_location_id)
        .bind(movement.to_location_id)
        .bind(&movement.comment)
        .bind(movement.actor_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE equipment SET location_id = $1 WHERE id = $2")
            .bind(movement.to_location_id)
            .bind(movement.equipment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(MovementRecord {
            id: row.get("id"),
            equipment_id: movement.equipment_id,
            from_location_id: movement.from_location_id,
            to_location_id: movement.to_location_id,
            comment: movement.comment,
            actor_id: movement.actor_id,
            recorded_at: row.get::<chrono::NaiveDateTime, _>("recorded_at").and_utc(),
        })
    }
}
