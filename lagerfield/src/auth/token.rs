use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use super::{AuthError, AuthResult};
use crate::models::{AdminUser, Role};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &AdminUser) -> AuthResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }

    /// Pull the token out of an `Authorization: Bearer <token>` value.
    pub fn bearer(header: &str) -> AuthResult<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AdminUser {
        let mut user = AdminUser::new("admin", "admin@example.com", "hash".to_string(), Role::Admin);
        user.id = "user-1".to_string();
        user
    }

    #[test]
    fn issued_tokens_validate() {
        let tokens = TokenService::new("secret", 24);
        let token = tokens.issue(&user()).unwrap();
        let claims = tokens.validate(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn foreign_and_expired_tokens_fail() {
        let token = TokenService::new("other", 24).issue(&user()).unwrap();
        assert!(matches!(
            TokenService::new("secret", 24).validate(&token),
            Err(AuthError::InvalidToken(_))
        ));

        let expired = TokenService::new("secret", -1).issue(&user()).unwrap();
        assert!(matches!(TokenService::new("secret", 24).validate(&expired), Err(AuthError::Expired)));
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(TokenService::bearer("Bearer abc").unwrap(), "abc");
        assert!(TokenService::bearer("abc").is_err());
        assert!(TokenService::bearer("Bearer ").is_err());
    }
}
