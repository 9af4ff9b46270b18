//! Shared TTL-capable store abstraction.
//!
//! All anti-abuse state (revocation entries, lockout counters, idempotency
//! claims) lives in a store that expires entries on its own. Components
//! receive the store as an injected trait object, so tests can substitute
//! doubles and a networked backend can slot in without touching the guards.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// Store errors.
///
/// Guards decide per operation whether an error degrades to allow or deny;
/// the store itself only reports what went wrong.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store unreachable: {0}")]
    Unavailable(String),

    /// The operation exceeded its deadline.
    #[error("store operation timed out")]
    Timeout,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value store with per-entry expiry.
///
/// Every operation is atomic with respect to concurrent callers; callers
/// never compose a read-then-write pair to get their semantics.
#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Set a sentinel value, overwriting any previous entry.
    async fn set_with_ttl(&self, key: &str, ttl: Duration) -> StoreResult<()>;

    /// Set a sentinel only if the key is absent.
    ///
    /// Returns `true` when this call created the entry. Exactly one of any
    /// number of concurrent callers with the same key observes `true`.
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Whether a live entry exists for `key`.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Remaining lifetime of `key`, or `None` when absent or expired.
    async fn remaining_ttl(&self, key: &str) -> StoreResult<Option<Duration>>;

    /// Current counter value, `0` when absent or expired.
    async fn counter(&self, key: &str) -> StoreResult<i64>;

    /// Increment a counter, resetting its lifetime to `ttl` on every call
    /// (sliding window).
    async fn incr_refresh_ttl(&self, key: &str, ttl: Duration) -> StoreResult<i64>;

    /// Increment a counter, setting its lifetime only when the entry is
    /// created (fixed window).
    async fn incr_keep_ttl(&self, key: &str, ttl: Duration) -> StoreResult<i64>;

    /// Delete the given keys. Missing keys are not an error.
    async fn remove(&self, keys: &[String]) -> StoreResult<()>;
}

/// Run a store operation under a deadline.
///
/// The store may sit across the network; no guard operation is allowed to
/// stall a request indefinitely.
pub async fn bounded<T, F>(limit: Duration, op: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, op).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout),
    }
}
