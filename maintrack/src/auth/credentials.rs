//! Password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::errors::{AuthError, AuthResult};

/// Verifies a presented secret against a stored Argon2id hash.
///
/// A server-side pepper is appended to every secret before hashing, so a
/// leaked database alone is not enough to mount an offline attack.
#[derive(Clone)]
pub struct CredentialStore {
    pepper: String,
}

impl CredentialStore {
    pub fn new(pepper: String) -> Self {
        Self { pepper }
    }

    /// Hash a secret with Argon2id + pepper.
    pub fn hash_secret(&self, secret: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", secret, self.pepper);
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify a secret against a stored hash.
    ///
    /// Returns plain `false` for both a mismatch and an unparseable hash;
    /// callers must not be able to distinguish the two.
    pub fn verify_secret(&self, secret: &str, hash: &str) -> bool {
        let peppered = format!("{}{}", secret, self.pepper);
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
