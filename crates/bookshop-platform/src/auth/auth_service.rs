//! Authentication Service
//!
//! JWT access token generation and validation, HMAC-SHA256 signed.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::account::entity::User;
use crate::shared::error::{Result, ShopError};

/// JWT Claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Username the token was minted for
    pub name: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID (unique identifier)
    pub jti: String,

    /// Roles held by the user
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Configuration for the auth service
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret key for HS256
    pub secret_key: String,

    /// Token issuer
    pub issuer: String,

    /// Token audience
    pub audience: String,

    /// Access token expiration in seconds
    pub access_token_expiry_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            issuer: "bookshop".to_string(),
            audience: "bookshop-api".to_string(),
            access_token_expiry_secs: 3600, // 1 hour
        }
    }
}

/// Authentication service for token management
pub struct AuthService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    /// Create the auth service from an HMAC secret (HS256)
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());

        info!("AuthService initialized with HS256");

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.access_token_expiry_secs);

        let claims = AccessTokenClaims {
            sub: user.id.clone(),
            name: user.username.clone(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            roles: user.roles.clone(),
        };

        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| ShopError::Internal { message: format!("Failed to encode JWT: {}", e) })?;

        Ok((token, exp))
    }

    /// Validate an access token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => ShopError::TokenExpired,
                _ => ShopError::InvalidToken { message: format!("{}", e) },
            })
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshop_common::{ROLE_ADMIN, ROLE_USER};

    fn test_service() -> AuthService {
        AuthService::new(AuthConfig {
            secret_key: "unit-test-secret".to_string(),
            ..AuthConfig::default()
        })
    }

    fn test_user(roles: &[&str]) -> User {
        User::new("alice", "alice@example.com", "$argon2id$fake")
            .with_roles(roles.iter().map(|r| r.to_string()).collect())
    }

    #[test]
    fn test_generate_and_validate_token() {
        let service = test_service();
        let user = test_user(&[ROLE_ADMIN]);

        let (token, exp) = service.generate_access_token(&user).unwrap();
        assert!(exp > Utc::now());

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.name, "alice");
        assert!(claims.roles.contains(&ROLE_ADMIN.to_string()));
    }

    #[test]
    fn test_roles_survive_round_trip() {
        let service = test_service();
        let user = test_user(&[ROLE_USER]);

        let (token, _) = service.generate_access_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.roles, vec![ROLE_USER.to_string()]);
        assert!(!claims.roles.contains(&ROLE_ADMIN.to_string()));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let service = test_service();
        let other = AuthService::new(AuthConfig {
            secret_key: "a-different-secret".to_string(),
            ..AuthConfig::default()
        });

        let (token, _) = service.generate_access_token(&test_user(&[ROLE_USER])).unwrap();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let service = test_service();
        let other = AuthService::new(AuthConfig {
            secret_key: "unit-test-secret".to_string(),
            audience: "some-other-api".to_string(),
            ..AuthConfig::default()
        });

        let (token, _) = service.generate_access_token(&test_user(&[ROLE_USER])).unwrap();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }
}
