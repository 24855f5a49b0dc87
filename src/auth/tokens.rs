use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

pub type TokenError = jsonwebtoken::errors::Error;

/// Claims carried by a short-lived access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id
    pub sub: String,
    pub user_name: String,
    pub email: String,
    pub token_type: String,
    /// Unique token id
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a long-lived refresh token. Only the user id; the
/// token must also match the single value stored on the user row.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub token_type: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_access_token(
    config: &AuthConfig,
    user_id: i32,
    user_name: &str,
    email: &str,
) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user_id.to_string(),
        user_name: user_name.to_string(),
        email: email.to_string(),
        token_type: TOKEN_TYPE_ACCESS.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(config.access_token_ttl_mins)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.access_token_secret.as_bytes()),
    )
}

pub fn issue_refresh_token(config: &AuthConfig, user_id: i32) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = RefreshClaims {
        sub: user_id.to_string(),
        token_type: TOKEN_TYPE_REFRESH.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(config.refresh_token_ttl_days)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
    )
}

pub fn verify_access_token(config: &AuthConfig, token: &str) -> Result<AccessClaims, TokenError> {
    let data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(config.access_token_secret.as_bytes()),
        &Validation::default(),
    )?;
    if data.claims.token_type != TOKEN_TYPE_ACCESS {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(data.claims)
}

pub fn verify_refresh_token(config: &AuthConfig, token: &str) -> Result<RefreshClaims, TokenError> {
    let data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
        &Validation::default(),
    )?;
    if data.claims.token_type != TOKEN_TYPE_REFRESH {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access-secret-for-tests-0123456789".to_string(),
            refresh_token_secret: "refresh-secret-for-tests-0123456789".to_string(),
            access_token_ttl_mins: 60,
            refresh_token_ttl_days: 10,
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let config = test_config();
        let token = issue_access_token(&config, 42, "chai", "chai@example.com").unwrap();
        let claims = verify_access_token(&config, &token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_name, "chai");
        assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn refresh_token_roundtrip() {
        let config = test_config();
        let token = issue_refresh_token(&config, 7).unwrap();
        let claims = verify_refresh_token(&config, &token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.token_type, TOKEN_TYPE_REFRESH);
    }

    #[test]
    fn refresh_token_is_not_a_valid_access_token() {
        let config = test_config();
        let token = issue_refresh_token(&config, 7).unwrap();
        assert!(verify_access_token(&config, &token).is_err());
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let mut config = test_config();
        config.access_token_ttl_mins = -5;
        let token = issue_access_token(&config, 1, "u", "u@example.com").unwrap();
        assert!(verify_access_token(&config, &token).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let config = test_config();
        let mut other = test_config();
        other.access_token_secret = "a-completely-different-secret-value".to_string();
        let token = issue_access_token(&other, 1, "u", "u@example.com").unwrap();
        assert!(verify_access_token(&config, &token).is_err());
    }

    #[test]
    fn two_tokens_get_distinct_jtis() {
        let config = test_config();
        let a = issue_refresh_token(&config, 1).unwrap();
        let b = issue_refresh_token(&config, 1).unwrap();
        assert_ne!(a, b);
    }
}
