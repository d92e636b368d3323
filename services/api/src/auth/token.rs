//! services/api/src/auth/token.rs
//!
//! Stateless session tokens: HS256-signed JWTs carrying the subject id and an
//! expiry. Verification is pure; rotating the secret invalidates every token.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mesto_core::ObjectId;
use serde::{Deserialize, Serialize};

/// Lifetime of a session token (and of the session cookie carrying it).
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Issue(String),
    #[error("Invalid token: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::days(SESSION_TTL_DAYS))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: &ObjectId) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Issue(e.to_string()))
    }

    /// Checks signature and expiry and returns the subject.
    pub fn verify(&self, token: &str) -> Result<ObjectId, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        ObjectId::parse(&data.claims.sub).map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_to_its_subject() {
        let tokens = TokenService::new("secret");
        let subject = ObjectId::generate();
        let token = tokens.issue(&subject).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), subject);
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = TokenService::with_ttl("secret", Duration::seconds(-10));
        let token = expired.issue(&ObjectId::generate()).unwrap();
        assert!(matches!(
            TokenService::new("secret").verify(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn rotated_secret_invalidates_tokens() {
        let token = TokenService::new("old").issue(&ObjectId::generate()).unwrap();
        assert!(TokenService::new("new").verify(&token).is_err());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let tokens = TokenService::new("secret");
        let token = tokens.issue(&ObjectId::generate()).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_owned).collect();
        let other = tokens.issue(&ObjectId::generate()).unwrap();
        parts[1] = other.split('.').nth(1).unwrap().to_owned();
        assert!(tokens.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn subject_must_be_an_object_id() {
        let claims = Claims {
            sub: "not-an-id".into(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(TokenService::new("secret").verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(TokenService::new("secret").verify("a.b.c").is_err());
        assert!(TokenService::new("secret").verify("").is_err());
    }
}
