//! Revocation ledger for issued token ids.
//!
//! Each entry lives only as long as the token it invalidates (plus a small
//! margin); the store's TTL does the cleanup. The read side deliberately
//! returns the raw store error so each caller applies its own fail-open or
//! fail-closed policy.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::info;

use crate::auth::models::Claims;
use crate::store::{StoreResult, TtlStore, bounded};

/// Floor applied when a caller asks to revoke with no remaining lifetime.
/// A revoked token must never silently become "not revoked".
const DEFAULT_REVOCATION_TTL: Duration = Duration::from_secs(3600);

/// Safety margin added on top of a token's remaining lifetime.
const REVOCATION_MARGIN_SECS: i64 = 60;

/// Records invalidated token ids until their natural expiry.
pub struct RevocationLedger {
    store: Arc<dyn TtlStore>,
    op_timeout: Duration,
}

fn revocation_key(jti: &str) -> String {
    format!("revoked:jti:{jti}")
}

impl RevocationLedger {
    pub fn new(store: Arc<dyn TtlStore>, op_timeout: Duration) -> Self {
        Self { store, op_timeout }
    }

    /// Record `jti` as revoked for `ttl`.
    ///
    /// A zero TTL is floored to a safe default rather than producing an
    /// entry that is permanent or already expired.
    pub async fn revoke(&self, jti: &str, ttl: Duration) -> StoreResult<()> {
        let ttl = if ttl.is_zero() {
            DEFAULT_REVOCATION_TTL
        } else {
            ttl
        };

        bounded(
            self.op_timeout,
            self.store.set_with_ttl(&revocation_key(jti), ttl),
        )
        .await?;
        info!("token revoked (event=token_revoked): jti={jti}");
        Ok(())
    }

    /// Revoke the token behind `claims` for its remaining lifetime plus a
    /// margin, so the entry never outlives the token by much.
    pub async fn revoke_by_claims(&self, claims: &Claims) -> StoreResult<()> {
        let remaining = (claims.exp - Utc::now().timestamp()).max(0) + REVOCATION_MARGIN_SECS;
        self.revoke(&claims.jti, Duration::from_secs(remaining as u64))
            .await
    }

    /// Whether `jti` is on the ledger.
    ///
    /// Policy on store failure belongs to the caller: the request guard and
    /// the refresh path fail closed, and must log the degraded decision.
    pub async fn is_revoked(&self, jti: &str) -> StoreResult<bool> {
        bounded(self.op_timeout, self.store.exists(&revocation_key(jti))).await
    }
}
