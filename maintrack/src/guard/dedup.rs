//! Request-level idempotency, debounce, and rate-window guards.
//!
//! All three are built on single atomic store operations, so two concurrent
//! duplicates of the same request resolve to exactly one winner. They are
//! defense in depth in front of hardware-triggered mutations: when the
//! store is unreachable they degrade to allow, but the degraded outcome is
//! its own variant so it never masquerades as a deliberate pass.

use std::sync::Arc;
use std::time::Duration;

use log::warn;

use crate::store::{TtlStore, bounded};

/// Result of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The request claimed its slot
    Allowed,
    /// The store was unreachable; the request passes because this guard is
    /// not the primary gate. Logged at the point of decision.
    AllowedDegraded,
    /// A prior identical request already holds the slot
    Rejected,
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, GuardOutcome::Rejected)
    }
}

/// Duplicate-suppression guard over the shared TTL store.
pub struct DedupGuard {
    store: Arc<dyn TtlStore>,
    op_timeout: Duration,
}

impl DedupGuard {
    pub fn new(store: Arc<dyn TtlStore>, op_timeout: Duration) -> Self {
        Self { store, op_timeout }
    }

    /// Claim a client-supplied idempotency key for `ttl`.
    ///
    /// `Rejected` means an identical request is still inside its dedup
    /// window and the caller must answer with a conflict.
    pub async fn check_idempotent(&self, key: &str, ttl: Duration) -> GuardOutcome {
        self.claim(&format!("idem:{key}"), ttl, "idempotency").await
    }

    /// Claim a composite (actor, action, target) key for a short cool-down,
    /// throttling near-duplicate triggers such as a badge tapped twice.
    pub async fn check_debounce(&self, key: &str, ttl: Duration) -> GuardOutcome {
        self.claim(&format!("debounce:{key}"), ttl, "debounce").await
    }

    /// Count this request against a fixed window; reject once more than
    /// `limit` requests land inside it.
    pub async fn check_rate_window(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> GuardOutcome {
        let count = match bounded(
            self.op_timeout,
            self.store.incr_keep_ttl(&format!("rate:{key}"), window),
        )
        .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!("rate window degraded, allowing (event=guard_degraded guard=rate): {e}");
                return GuardOutcome::AllowedDegraded;
            }
        };

        if count > i64::from(limit) {
            GuardOutcome::Rejected
        } else {
            GuardOutcome::Allowed
        }
    }

    async fn claim(&self, key: &str, ttl: Duration, guard: &str) -> GuardOutcome {
        match bounded(self.op_timeout, self.store.set_if_absent(key, ttl)).await {
            Ok(true) => GuardOutcome::Allowed,
            Ok(false) => GuardOutcome::Rejected,
            Err(e) => {
                warn!("{guard} check degraded, allowing (event=guard_degraded guard={guard}): {e}");
                GuardOutcome::AllowedDegraded
            }
        }
    }
}
