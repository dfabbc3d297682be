//! HS256 bearer tokens
//!
//! Tokens are minted by the credential service that shares `JWT_SECRET` with the vault.
//! The vault only verifies them; [`JwtService::issue`] exists for tooling and tests.

use super::models::{ClaimsUser, JwtClaims};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use vault_core::{AppError, OwnerId};

#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a token for `owner` valid for `ttl`.
    pub fn issue(&self, owner: &OwnerId, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = JwtClaims {
            user: ClaimsUser {
                id: owner.as_str().to_string(),
            },
            exp: (now + ttl).timestamp(),
            iat: Some(now.timestamp()),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Check signature and expiry, returning the owner the token speaks for.
    pub fn verify(&self, token: &str) -> Result<OwnerId, AppError> {
        let data = decode::<JwtClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            AppError::Unauthenticated("Token is not valid".to_string())
        })?;

        let id = data.claims.user.id.trim();
        if id.is_empty() {
            return Err(AppError::Unauthenticated("Token is not valid".to_string()));
        }
        Ok(OwnerId::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters";

    #[test]
    fn test_issue_and_verify() {
        let jwt = JwtService::new(SECRET);
        let token = jwt.issue(&OwnerId::new("user-a"), Duration::hours(1)).unwrap();
        assert_eq!(jwt.verify(&token).unwrap(), OwnerId::new("user-a"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtService::new(SECRET)
            .issue(&OwnerId::new("user-a"), Duration::hours(1))
            .unwrap();
        let other = JwtService::new("another-secret-that-is-also-long-enough");
        assert!(matches!(
            other.verify(&token),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JwtService::new(SECRET);
        let token = jwt.issue(&OwnerId::new("user-a"), Duration::minutes(-5)).unwrap();
        assert!(jwt.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(JwtService::new(SECRET).verify("not.a.jwt").is_err());
    }

    #[test]
    fn test_empty_user_id_rejected() {
        let jwt = JwtService::new(SECRET);
        let token = jwt.issue(&OwnerId::new(" "), Duration::hours(1)).unwrap();
        assert!(jwt.verify(&token).is_err());
    }
}
