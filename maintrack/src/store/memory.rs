//! In-memory `TtlStore` backed by a single async `RwLock`.
//!
//! Suitable for tests and single-node deployments; a Redis-style networked
//! backend implements the same trait for multi-node setups. Entries expire
//! lazily: an expired slot is treated as absent and replaced by the next
//! write that touches its key.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{StoreResult, TtlStore};

#[derive(Debug, Clone, Copy)]
struct Slot {
    count: i64,
    expires_at: Instant,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Process-local store implementation.
#[derive(Default)]
pub struct MemoryStore {
    slots: tokio::sync::RwLock<HashMap<String, Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired slots, returning how many were removed.
    ///
    /// Lazy expiry keeps reads correct without this; calling it periodically
    /// only bounds memory growth for keys that are never touched again.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, slot| slot.is_live(now));
        before - slots.len()
    }
}

#[async_trait]
impl TtlStore for MemoryStore {
    async fn set_with_ttl(&self, key: &str, ttl: Duration) -> StoreResult<()> {
        let mut slots = self.slots.write().await;
        slots.insert(
            key.to_string(),
            Slot {
                count: 1,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        match slots.get(key) {
            Some(slot) if slot.is_live(now) => Ok(false),
            _ => {
                slots.insert(
                    key.to_string(),
                    Slot {
                        count: 1,
                        expires_at: now + ttl,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let now = Instant::now();
        let slots = self.slots.read().await;
        Ok(slots.get(key).is_some_and(|slot| slot.is_live(now)))
    }

    async fn remaining_ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let now = Instant::now();
        let slots = self.slots.read().await;
        Ok(slots
            .get(key)
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.expires_at - now))
    }

    async fn counter(&self, key: &str) -> StoreResult<i64> {
        let now = Instant::now();
        let slots = self.slots.read().await;
        Ok(slots
            .get(key)
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.count)
            .unwrap_or(0))
    }

    async fn incr_refresh_ttl(&self, key: &str, ttl: Duration) -> StoreResult<i64> {
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        let count = match slots.get(key) {
            Some(slot) if slot.is_live(now) => slot.count + 1,
            _ => 1,
        };
        slots.insert(
            key.to_string(),
            Slot {
                count,
                expires_at: now + ttl,
            },
        );
        Ok(count)
    }

    async fn incr_keep_ttl(&self, key: &str, ttl: Duration) -> StoreResult<i64> {
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        match slots.get_mut(key) {
            Some(slot) if slot.is_live(now) => {
                slot.count += 1;
                Ok(slot.count)
            }
            _ => {
                slots.insert(
                    key.to_string(),
                    Slot {
                        count: 1,
                        expires_at: now + ttl,
                    },
                );
                Ok(1)
            }
        }
    }

    async fn remove(&self, keys: &[String]) -> StoreResult<()> {
        let mut slots = self.slots.write().await;
        for key in keys {
            slots.remove(key);
        }
        Ok(())
    }
}
