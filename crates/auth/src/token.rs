//! Token service: issues and verifies signed, time-limited identity tokens.
//!
//! Tokens are HS256 JWTs. Verification is pure CPU work (no IO) and never
//! panics; every failure is reported as a [`TokenValidationError`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::{Identity, IdentityClaims, TokenValidationError, validate_claims};

/// Default validity window for issued tokens, in days.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issue/verify contract used by the account service and the access gate.
pub trait TokenService: Send + Sync {
    fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken, TokenError>;

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaims, TokenValidationError>;

    /// Validity window applied by `issue`.
    fn ttl(&self) -> Duration;
}

/// HMAC-SHA256 JWT implementation keyed by a shared secret.
#[derive(Clone)]
pub struct Hs256TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256TokenService {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self::with_ttl(secret, Duration::days(DEFAULT_TOKEN_TTL_DAYS))
    }

    pub fn with_ttl(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    fn validation() -> Validation {
        // The time window is checked by `validate_claims` against the caller's
        // clock so that it is deterministic under test.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();
        validation
    }
}

impl core::fmt::Debug for Hs256TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService for Hs256TokenService {
    fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let claims = IdentityClaims {
            sub: identity.subject_id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role,
            iat: now,
            exp: now + self.ttl,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<IdentityClaims>(token, &self.decoding, &Self::validation())
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenValidationError::BadSignature,
                _ => TokenValidationError::Malformed,
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use shopfront_core::UserId;

    fn alice() -> Identity {
        Identity::new(UserId::new(), "alice@example.com", "Alice", Role::Customer)
    }

    #[test]
    fn verify_returns_the_issued_subject_for_the_whole_window() {
        let svc = Hs256TokenService::new("test-secret");
        let who = alice();
        let now = Utc::now();
        let issued = svc.issue(&who, now).unwrap();

        let claims = svc.verify(&issued.token, now).unwrap();
        assert_eq!(claims.sub, who.subject_id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.name, "Alice");

        let late = svc.verify(&issued.token, now + Duration::days(DEFAULT_TOKEN_TTL_DAYS) - Duration::seconds(1));
        assert_eq!(late.unwrap().sub, who.subject_id);
    }

    #[test]
    fn verify_fails_exactly_at_expiry() {
        let svc = Hs256TokenService::new("test-secret");
        let now = Utc::now();
        let issued = svc.issue(&alice(), now).unwrap();

        assert_eq!(
            svc.verify(&issued.token, now + Duration::days(DEFAULT_TOKEN_TTL_DAYS)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            svc.verify(&issued.token, now + Duration::days(DEFAULT_TOKEN_TTL_DAYS) + Duration::days(1)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = Hs256TokenService::new("secret-a");
        let verifier = Hs256TokenService::new("secret-b");
        let now = Utc::now();
        let issued = issuer.issue(&alice(), now).unwrap();

        assert_eq!(
            verifier.verify(&issued.token, now),
            Err(TokenValidationError::BadSignature)
        );
    }

    #[test]
    fn garbage_is_malformed_not_a_panic() {
        let svc = Hs256TokenService::new("test-secret");
        assert_eq!(svc.verify("", Utc::now()), Err(TokenValidationError::Malformed));
        assert_eq!(
            svc.verify("not.a.jwt", Utc::now()),
            Err(TokenValidationError::Malformed)
        );
    }

    #[test]
    fn role_survives_the_round_trip() {
        let svc = Hs256TokenService::new("test-secret");
        let admin = Identity::new(UserId::new(), "admin@example.com", "Admin", Role::Admin);
        let now = Utc::now();
        let issued = svc.issue(&admin, now).unwrap();

        let identity = Identity::from(svc.verify(&issued.token, now).unwrap());
        assert!(identity.is_admin());
    }

    #[test]
    fn custom_ttl_is_applied() {
        let svc = Hs256TokenService::with_ttl("test-secret", Duration::minutes(5));
        let now = Utc::now();
        let issued = svc.issue(&alice(), now).unwrap();
        assert_eq!(issued.expires_at, now + Duration::minutes(5));
        assert_eq!(svc.ttl(), Duration::minutes(5));
    }
}
