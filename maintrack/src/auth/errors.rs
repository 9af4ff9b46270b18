//! Authentication error types.

use thiserror::Error;

use crate::guard::lockout::LockScope;
use crate::store::StoreError;

/// Token codec failures.
///
/// Callers usually collapse all of these to a generic "unauthorized", but
/// the kinds stay distinct so policy and tests can tell them apart.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Issue was asked for a non-positive lifetime
    #[error("token lifetime must be positive")]
    NonPositiveLifetime,

    /// Signature did not verify against the configured key
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token is past its expiry, beyond any leeway
    #[error("token expired")]
    Expired,

    /// The token's not-before instant is still in the future
    #[error("token not yet valid")]
    NotYetValid,

    /// Issuer or audience does not match the configured values
    #[error("token issuer or audience mismatch")]
    ClaimMismatch,

    /// The token could not be parsed into the expected claim set
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Signing failed while issuing a token
    #[error("token encoding failed: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown principal, inactive account, or secret mismatch.
    /// Deliberately a single variant: callers must not learn which.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The principal or origin is under an active lockout
    #[error("too many attempts, retry in {retry_after}s")]
    TooManyAttempts { retry_after: u64, scope: LockScope },

    /// Token failed to decode or validate
    #[error(transparent)]
    Token(#[from] TokenError),

    /// A token of the wrong type was presented
    #[error("wrong token type")]
    WrongTokenType,

    /// The token's unique id is on the revocation ledger
    #[error("token revoked")]
    TokenRevoked,

    /// Logout was called with nothing to revoke
    #[error("no token supplied")]
    MissingToken,

    /// Password hashing failed
    #[error("password hashing failed")]
    HashingFailed,

    /// The shared store was unreachable for an operation that fails closed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information.
    ///
    /// Credential and token failures collapse to uniform wording; store and
    /// database errors are sanitized entirely. The full error stays in logs.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "Invalid credentials".to_string(),
            AuthError::TooManyAttempts { retry_after, .. } => {
                format!("Too many attempts. Retry in {retry_after}s")
            }
            AuthError::Token(_) | AuthError::WrongTokenType | AuthError::TokenRevoked => {
                "Invalid token".to_string()
            }
            AuthError::MissingToken => "No token supplied".to_string(),
            AuthError::Store(_) => "Service temporarily unavailable".to_string(),
            AuthError::Database(_) | AuthError::HashingFailed => {
                "Internal server error".to_string()
            }
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
