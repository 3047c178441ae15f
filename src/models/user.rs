//! User account model and session claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// User account from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string, or a legacy SHA-256 hex digest awaiting upgrade
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(length(min = 3, max = 50, message = "Username must be at least 3 characters long"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

impl RegisterUser {
    pub fn new(username: &str, password: &str, confirm_password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
            email: None,
        }
    }
}

/// JWT claims identifying a logged-in user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserClaims {
    /// Username
    pub sub: String,
    pub user_id: i64,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn for_user(user: &User, lifetime_hours: u64) -> Self {
        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(lifetime_hours)
            .unwrap_or(i64::MAX)
            .saturating_mul(3600);
        Self {
            sub: user.username.clone(),
            user_id: user.id,
            is_admin: user.is_admin,
            exp: now.saturating_add(lifetime),
            iat: now,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn username(&self) -> &str {
        &self.sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> User {
        User {
            id: 7,
            username: "alice".into(),
            password_digest: String::new(),
            email: None,
            is_admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let claims = UserClaims::for_user(&user(true), 1);
        let token = claims.create_token("secret").unwrap();
        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.user_id, 7);
        assert_eq!(decoded.username(), "alice");
        assert!(decoded.is_admin);
        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut claims = UserClaims::for_user(&user(false), 1);
        claims.exp = Utc::now().timestamp() - 3600;
        let token = claims.create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "secret").is_err());
    }

    #[test]
    fn test_huge_lifetime_saturates() {
        let claims = UserClaims::for_user(&user(false), u64::MAX);
        assert_eq!(claims.exp, i64::MAX);
        assert!(claims.exp > claims.iat);

        let claims = UserClaims::for_user(&user(false), 2);
        assert_eq!(claims.exp - claims.iat, 7200);
    }

    #[test]
    fn test_register_validation() {
        assert!(RegisterUser::new("bob", "secret1", "secret1").validate().is_ok());
        assert!(RegisterUser::new("bo", "secret1", "secret1").validate().is_err());
        assert!(RegisterUser::new("bob", "short", "short").validate().is_err());
        assert!(RegisterUser::new("bob", "secret1", "secret2").validate().is_err());
    }
}
