//! Signed session token codec.
//!
//! Encoding and decoding are pure functions of the token, the key, and the
//! clock. Nothing here touches the shared store; revocation is a separate
//! concern layered on top of the `jti` claim.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::errors::TokenError;
use super::models::{Claims, Role, TokenType};

/// Seconds `nbf` is backdated relative to `iat`.
const CLOCK_SKEW_SECS: i64 = 5;

/// HMAC signing algorithms accepted by the codec.
///
/// Restricting to the HMAC family keeps a single shared secret the only key
/// material the deployment has to manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    Hs256,
    Hs384,
    Hs512,
}

impl SigningAlgorithm {
    /// Parse an algorithm name, e.g. from configuration. Case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "HS256" => Some(SigningAlgorithm::Hs256),
            "HS384" => Some(SigningAlgorithm::Hs384),
            "HS512" => Some(SigningAlgorithm::Hs512),
            _ => None,
        }
    }

    fn as_jwt(self) -> Algorithm {
        match self {
            SigningAlgorithm::Hs256 => Algorithm::HS256,
            SigningAlgorithm::Hs384 => Algorithm::HS384,
            SigningAlgorithm::Hs512 => Algorithm::HS512,
        }
    }
}

/// Issues and validates signed, time-bounded session tokens.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenCodec {
    /// Create a codec from the shared signing secret.
    ///
    /// `issuer`/`audience` are optional: they are stamped into issued tokens
    /// and verified on decode only when configured, so deployments that do
    /// not set them keep working.
    pub fn new(
        secret: &str,
        algorithm: SigningAlgorithm,
        issuer: Option<String>,
        audience: Option<String>,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: algorithm.as_jwt(),
            issuer,
            audience,
        }
    }

    /// Build, sign, and serialize a token.
    ///
    /// Each call assigns a fresh random `jti`. Returns the serialized token
    /// together with the claims that went into it.
    ///
    /// # Errors
    ///
    /// * `TokenError::NonPositiveLifetime` - `ttl` is zero or negative
    /// * `TokenError::Encoding` - signing failed
    pub fn issue(
        &self,
        subject: &str,
        role: Role,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<(String, Claims), TokenError> {
        if ttl <= Duration::zero() {
            return Err(TokenError::NonPositiveLifetime);
        }

        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            typ: token_type,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            nbf: (now - Duration::seconds(CLOCK_SKEW_SECS)).timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = jsonwebtoken::encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding_key,
        )
        .map_err(TokenError::Encoding)?;

        Ok((token, claims))
    }

    /// Verify signature, expiry, not-before, and (when configured)
    /// issuer/audience, with `leeway_secs` of clock tolerance.
    pub fn decode(&self, token: &str, leeway_secs: u64) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = leeway_secs;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp"]);

        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(classify_decode_error)
    }

    /// Read claims without verifying signature or expiry.
    ///
    /// Only for recovering a `jti` to revoke during logout; never a basis
    /// for authorizing anything.
    pub fn decode_unverified(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        let no_required_claims: [&str; 0] = [];
        validation.set_required_spec_claims(&no_required_claims);

        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .ok()
            .map(|data| data.claims)
    }
}

fn classify_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => TokenError::ClaimMismatch,
        _ => TokenError::Malformed(err.to_string()),
    }
}
