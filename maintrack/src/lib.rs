//! # Maintrack
//!
//! Authentication and anti-abuse core for a maintenance-tracking backend
//! (equipment, incidents, repairs, movements).
//!
//! The resource CRUD around it is ordinary; this crate carries the parts
//! with real protocol obligations:
//!
//! - **Token codec**: signed, time-bounded access/refresh tokens with a
//!   unique id per token ([`auth::token`])
//! - **Credential store**: Argon2id password verification with a
//!   server-side pepper ([`auth::credentials`])
//! - **Revocation ledger**: token ids invalidated until natural expiry
//!   ([`guard::revocation`])
//! - **Lockout guard**: sliding-window brute-force counters per principal
//!   and per origin ([`guard::lockout`])
//! - **Idempotency/debounce guard**: duplicate suppression for
//!   hardware-triggered mutations ([`guard::dedup`])
//! - **Session service**: login, refresh with rotation, logout
//!   ([`auth::session`])
//!
//! Shared state lives exclusively in a TTL-capable store behind the
//! [`store::TtlStore`] trait; components receive it by injection and every
//! guard operation is a single atomic store call.

/// Authentication components and the session protocol.
pub mod auth;
pub use auth::{
    AuthError, AuthResult, Claims, CredentialStore, Role, SessionService, SigningAlgorithm,
    TokenCodec, TokenError, TokenPair, TokenType, User,
};

/// Database pool and repository seams.
pub mod db;
pub use db::{Database, DatabaseConfig};

/// Anti-abuse guards over the shared store.
pub mod guard;
pub use guard::{
    DedupGuard, GuardOutcome, LockScope, LockoutConfig, LockoutGuard, LockoutPolicy,
    RevocationLedger,
};

/// TTL-capable store abstraction and the in-memory implementation.
pub mod store;
pub use store::{MemoryStore, StoreError, TtlStore};
