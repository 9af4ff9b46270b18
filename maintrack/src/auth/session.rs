//! Session service: login, refresh with rotation, and logout.
//!
//! Orchestrates the credential store, token codec, lockout guard, and
//! revocation ledger. Holds no mutable state of its own; everything shared
//! lives behind the injected store and repositories, so concurrent requests
//! need no coordination here.

use std::sync::Arc;

use chrono::Duration;
use log::{info, warn};

use super::credentials::CredentialStore;
use super::errors::{AuthError, AuthResult};
use super::models::{Role, TokenPair, TokenType};
use super::token::TokenCodec;
use crate::db::repository::UserRepository;
use crate::guard::lockout::LockoutGuard;
use crate::guard::revocation::RevocationLedger;

/// Clock tolerance when decoding refresh and logout tokens.
const TOKEN_LEEWAY_SECS: u64 = 30;

/// Orchestrates the externally visible authentication protocol.
pub struct SessionService {
    users: Arc<dyn UserRepository>,
    credentials: CredentialStore,
    codec: Arc<TokenCodec>,
    revocations: Arc<RevocationLedger>,
    lockout: Arc<LockoutGuard>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        credentials: CredentialStore,
        codec: Arc<TokenCodec>,
        revocations: Arc<RevocationLedger>,
        lockout: Arc<LockoutGuard>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            users,
            credentials,
            codec,
            revocations,
            lockout,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Authenticate a principal and issue a fresh token pair.
    ///
    /// The lockout check runs before any credential work. Unknown
    /// principal, inactive account, and secret mismatch all collapse into
    /// one `InvalidCredentials`; each of them counts as a failure against
    /// both lockout keys.
    ///
    /// # Errors
    ///
    /// * `AuthError::TooManyAttempts` - principal or origin is locked out
    /// * `AuthError::InvalidCredentials` - authentication failed
    pub async fn login(
        &self,
        principal: &str,
        secret: &str,
        origin: &str,
    ) -> AuthResult<TokenPair> {
        let status = self.lockout.is_locked(principal, origin).await;
        if status.locked {
            warn!(
                "login blocked by lockout (event=auth_login_locked): principal={principal} origin={origin}"
            );
            return Err(AuthError::TooManyAttempts {
                retry_after: status.retry_after_secs,
                scope: status.scope.unwrap_or(crate::guard::lockout::LockScope::Principal),
            });
        }

        let candidate = self.users.find_by_principal(principal).await?;
        let user = match candidate {
            Some(user)
                if user.is_active
                    && self.credentials.verify_secret(secret, &user.password_hash) =>
            {
                user
            }
            _ => {
                self.lockout.record_failure(principal, origin).await;
                self.lockout.maybe_lock(principal, origin).await;
                warn!(
                    "login failed (event=auth_login_fail): principal={principal} origin={origin}"
                );
                return Err(AuthError::InvalidCredentials);
            }
        };

        self.lockout.reset_on_success(principal, origin).await;
        self.users.update_last_login(user.id).await?;

        info!(
            "login ok (event=auth_login_ok): user_id={} origin={origin}",
            user.id
        );
        self.issue_pair(&user.id.to_string(), user.role)
    }

    /// Exchange a refresh token for a new pair, rotating the old one.
    ///
    /// The presented token is revoked before the new pair is issued, so a
    /// stolen and replayed refresh token works at most once. The revocation
    /// check fails closed: if the store cannot answer, no tokens come out.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self.codec.decode(refresh_token, TOKEN_LEEWAY_SECS)?;

        if !claims.matches_type(TokenType::Refresh) {
            warn!("refresh with non-refresh token (event=auth_refresh_wrong_type)");
            return Err(AuthError::WrongTokenType);
        }

        match self.revocations.is_revoked(&claims.jti).await {
            Ok(true) => {
                warn!("refresh with revoked token (event=auth_refresh_revoked): jti={}", claims.jti);
                return Err(AuthError::TokenRevoked);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(
                    "revocation check unavailable, rejecting refresh (event=auth_refresh_store_down): {e}"
                );
                return Err(AuthError::Store(e));
            }
        }

        // Rotation: the old token must be dead before the new pair exists.
        self.revocations.revoke_by_claims(&claims).await?;

        info!("tokens refreshed (event=auth_refresh_ok): sub={}", claims.sub);
        self.issue_pair(&claims.sub, claims.role)
    }

    /// Revoke whichever of the two tokens are supplied.
    ///
    /// An expired access token is still revocable: decode failures fall
    /// back to unverified claims purely to recover the id. A refresh token
    /// in the body only counts if it really is a refresh token. Returns the
    /// number of tokens revoked.
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingToken` - neither token was supplied
    pub async fn logout(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> AuthResult<u32> {
        if access_token.is_none() && refresh_token.is_none() {
            return Err(AuthError::MissingToken);
        }

        let mut revoked = 0;

        if let Some(token) = access_token {
            let claims = self
                .codec
                .decode(token, TOKEN_LEEWAY_SECS)
                .ok()
                .or_else(|| self.codec.decode_unverified(token));

            if let Some(claims) = claims {
                self.revocations.revoke_by_claims(&claims).await?;
                revoked += 1;
            }
        }

        if let Some(token) = refresh_token {
            let claims = self
                .codec
                .decode(token, TOKEN_LEEWAY_SECS)
                .ok()
                .or_else(|| self.codec.decode_unverified(token));

            if let Some(claims) = claims.filter(|c| c.matches_type(TokenType::Refresh)) {
                self.revocations.revoke_by_claims(&claims).await?;
                revoked += 1;
            }
        }

        info!("logout (event=auth_logout): revoked_count={revoked}");
        Ok(revoked)
    }

    fn issue_pair(&self, subject: &str, role: Role) -> AuthResult<TokenPair> {
        let (access_token, _) =
            self.codec
                .issue(subject, role, TokenType::Access, self.access_ttl)?;
        let (refresh_token, _) =
            self.codec
                .issue(subject, role, TokenType::Refresh, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }
}
