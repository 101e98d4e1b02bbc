//! HS256 bearer tokens.
//!
//! Signing/verification is delegated to `jsonwebtoken`; the time window is
//! checked by [`validate_claims`] against an explicit `now` so callers (and
//! tests) control the clock.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use thiserror::Error;

use crate::{AccessClaims, Principal, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature does not verify")]
    BadSignature,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("failed to encode token: {0}")]
    Encode(String),
}

/// A freshly signed access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Verifies a bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError>;
}

/// Signs access tokens for authenticated principals.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<IssuedToken, TokenError>;
}

/// Shared-secret HS256 implementation of both sides.
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256Jwt {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl core::fmt::Debug for Hs256Jwt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Jwt").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the caller's clock.
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl TokenIssuer for Hs256Jwt {
    fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.ttl;
        let claims = AccessClaims::new(principal, now, expires_at);
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }
}

#[cfg(test)]
mod tests {
    use stockbook_core::UserId;

    use super::*;
    use crate::Role;

    fn principal() -> Principal {
        Principal {
            user_id: UserId::new(),
            username: "secretaria".to_string(),
            role: Role::Secretaria,
        }
    }

    #[test]
    fn issued_token_validates_and_carries_identity() {
        let jwt = Hs256Jwt::new(b"test-secret", Duration::minutes(30));
        let now = Utc::now();
        let p = principal();

        let issued = jwt.issue(&p, now).unwrap();
        assert_eq!(issued.expires_at, now + Duration::minutes(30));

        let claims = jwt.validate(&issued.token, now).unwrap();
        assert_eq!(claims.principal(), p);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let signer = Hs256Jwt::new(b"one-secret", Duration::minutes(30));
        let verifier = Hs256Jwt::new(b"another-secret", Duration::minutes(30));
        let now = Utc::now();

        let issued = signer.issue(&principal(), now).unwrap();
        assert_eq!(verifier.validate(&issued.token, now), Err(TokenError::BadSignature));
    }

    #[test]
    fn token_is_rejected_once_expired() {
        let jwt = Hs256Jwt::new(b"test-secret", Duration::minutes(5));
        let now = Utc::now();
        let issued = jwt.issue(&principal(), now).unwrap();

        let later = now + Duration::minutes(6);
        assert_eq!(
            jwt.validate(&issued.token, later),
            Err(TokenError::Claims(TokenValidationError::Expired))
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let jwt = Hs256Jwt::new(b"test-secret", Duration::minutes(5));
        assert!(matches!(
            jwt.validate("not.a.jwt", Utc::now()),
            Err(TokenError::Malformed(_))
        ));
    }
}
