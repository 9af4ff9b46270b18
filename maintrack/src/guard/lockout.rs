//! Sliding-window brute-force lockout.
//!
//! Failed authentication attempts are counted twice: once per normalized
//! principal and once per network origin. Each counter has a sliding TTL
//! that resets on every failure, so rapid retries keep extending the
//! window. Crossing a threshold sets a lock flag with its own fixed TTL.
//!
//! Store outages degrade to allow: the lockout is defense in depth, not the
//! primary gate, and a dead store must not turn into a global login outage.
//! Every degraded decision is logged.

use std::sync::Arc;
use std::time::Duration;

use log::{error, warn};
use serde::Serialize;

use crate::store::{StoreError, TtlStore, bounded};

/// Which key tripped a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LockScope {
    Principal,
    Origin,
}

impl LockScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockScope::Principal => "principal",
            LockScope::Origin => "origin",
        }
    }
}

/// Outcome of a lock check.
#[derive(Debug, Clone, Copy)]
pub struct LockStatus {
    pub locked: bool,
    pub retry_after_secs: u64,
    pub scope: Option<LockScope>,
}

impl LockStatus {
    fn clear() -> Self {
        Self {
            locked: false,
            retry_after_secs: 0,
            scope: None,
        }
    }

    fn tripped(scope: LockScope, retry_after_secs: u64) -> Self {
        Self {
            locked: true,
            retry_after_secs,
            scope: Some(scope),
        }
    }
}

/// Threshold and window configuration for one counter family.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    /// Failures at or above this count trip the lock
    pub max_fails: u32,
    /// Sliding lifetime of the failure counter
    pub window: Duration,
    /// Fixed lifetime of the lock flag once set
    pub lockout: Duration,
}

/// Independent policies for the principal and origin counters.
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    pub principal: LockoutPolicy,
    pub origin: LockoutPolicy,
}

/// Tracks failed-authentication counters and enforces temporary lockouts.
pub struct LockoutGuard {
    store: Arc<dyn TtlStore>,
    config: LockoutConfig,
    op_timeout: Duration,
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn principal_fails_key(principal: &str) -> String {
    format!("rl:login:user:{principal}:fails")
}

fn principal_lock_key(principal: &str) -> String {
    format!("rl:login:user:{principal}:lock")
}

fn origin_fails_key(origin: &str) -> String {
    format!("rl:login:ip:{origin}:fails")
}

fn origin_lock_key(origin: &str) -> String {
    format!("rl:login:ip:{origin}:lock")
}

impl LockoutGuard {
    pub fn new(store: Arc<dyn TtlStore>, config: LockoutConfig, op_timeout: Duration) -> Self {
        Self {
            store,
            config,
            op_timeout,
        }
    }

    /// Check the lock flags for both keys.
    ///
    /// The principal lock takes priority in the reported scope when both
    /// are set.
    pub async fn is_locked(&self, principal: &str, origin: &str) -> LockStatus {
        let principal = normalize(principal);
        let origin = normalize(origin);

        match self.lock_ttl(&principal_lock_key(&principal)).await {
            Ok(Some(ttl)) => return LockStatus::tripped(LockScope::Principal, ttl.as_secs().max(1)),
            Ok(None) => {}
            Err(e) => {
                warn!("lockout check degraded, allowing (event=lockout_check_degraded): {e}");
                return LockStatus::clear();
            }
        }

        match self.lock_ttl(&origin_lock_key(&origin)).await {
            Ok(Some(ttl)) => LockStatus::tripped(LockScope::Origin, ttl.as_secs().max(1)),
            Ok(None) => LockStatus::clear(),
            Err(e) => {
                warn!("lockout check degraded, allowing (event=lockout_check_degraded): {e}");
                LockStatus::clear()
            }
        }
    }

    /// Count one failed attempt against both keys, refreshing each
    /// counter's sliding window. Returns the updated counts.
    pub async fn record_failure(&self, principal: &str, origin: &str) -> (i64, i64) {
        let principal = normalize(principal);
        let origin = normalize(origin);

        let principal_count = bounded(
            self.op_timeout,
            self.store
                .incr_refresh_ttl(&principal_fails_key(&principal), self.config.principal.window),
        )
        .await
        .unwrap_or_else(|e| {
            warn!("failure counter unavailable (event=lockout_record_degraded): {e}");
            0
        });

        let origin_count = bounded(
            self.op_timeout,
            self.store
                .incr_refresh_ttl(&origin_fails_key(&origin), self.config.origin.window),
        )
        .await
        .unwrap_or_else(|e| {
            warn!("failure counter unavailable (event=lockout_record_degraded): {e}");
            0
        });

        (principal_count, origin_count)
    }

    /// Set a lock flag if either counter has reached its threshold.
    ///
    /// The flag is set only when absent: the first setter wins and an
    /// existing lock is never extended. Returns the lock state with the
    /// flag's remaining TTL.
    pub async fn maybe_lock(&self, principal: &str, origin: &str) -> LockStatus {
        let principal = normalize(principal);
        let origin = normalize(origin);

        if let Some(status) = self
            .lock_scope_if_over(
                &principal_fails_key(&principal),
                &principal_lock_key(&principal),
                &self.config.principal,
                LockScope::Principal,
            )
            .await
        {
            return status;
        }

        if let Some(status) = self
            .lock_scope_if_over(
                &origin_fails_key(&origin),
                &origin_lock_key(&origin),
                &self.config.origin,
                LockScope::Origin,
            )
            .await
        {
            return status;
        }

        LockStatus::clear()
    }

    /// Clear both counters and both lock flags.
    ///
    /// Called on every successful authentication so a later legitimate
    /// failure starts from a clean slate.
    pub async fn reset_on_success(&self, principal: &str, origin: &str) {
        let principal = normalize(principal);
        let origin = normalize(origin);

        let keys = vec![
            principal_fails_key(&principal),
            origin_fails_key(&origin),
            principal_lock_key(&principal),
            origin_lock_key(&origin),
        ];

        if let Err(e) = bounded(self.op_timeout, self.store.remove(&keys)).await {
            error!("failed to clear lockout state after successful login (event=lockout_reset_failed): {e}");
        }
    }

    async fn lock_ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        bounded(self.op_timeout, self.store.remaining_ttl(key)).await
    }

    async fn lock_scope_if_over(
        &self,
        fails_key: &str,
        lock_key: &str,
        policy: &LockoutPolicy,
        scope: LockScope,
    ) -> Option<LockStatus> {
        let count = match bounded(self.op_timeout, self.store.counter(fails_key)).await {
            Ok(count) => count,
            Err(e) => {
                warn!("lock evaluation degraded, allowing (event=lockout_eval_degraded): {e}");
                return None;
            }
        };

        if count < i64::from(policy.max_fails) {
            return None;
        }

        if let Err(e) = bounded(
            self.op_timeout,
            self.store.set_if_absent(lock_key, policy.lockout),
        )
        .await
        {
            warn!("could not set lock flag (event=lockout_set_degraded): {e}");
            return None;
        }

        let retry_after = match self.lock_ttl(lock_key).await {
            Ok(Some(ttl)) => ttl.as_secs().max(1),
            _ => policy.lockout.as_secs(),
        };

        Some(LockStatus::tripped(scope, retry_after))
    }
}
