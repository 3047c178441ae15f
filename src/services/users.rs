//! Account registration and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sha2::{Digest, Sha256};
use validator::Validate;

use crate::{
    config::{AuthConfig, UsersConfig},
    error::{AppError, AppResult},
    models::{
        non_blank,
        user::{RegisterUser, User, UserClaims},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new, non-admin account
    pub async fn register(&self, mut request: RegisterUser) -> AppResult<User> {
        request.username = request.username.trim().to_string();
        request.email = non_blank(request.email);
        request.validate()?;

        if self.repository.users.username_exists(&request.username).await? {
            return Err(AppError::Duplicate("Username already exists".to_string()));
        }

        let digest = self.hash_password(&request.password)?;
        let user = self
            .repository
            .users
            .create(&request.username, &digest, request.email.as_deref(), false)
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Authenticate by username and password, returning a session token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Please enter both username and password".to_string(),
            ));
        }

        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.verify_password(&user, password).await? {
            tracing::warn!(username = %username, "Failed login attempt");
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    /// Decode and check a session token
    pub fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))
    }

    /// Seed the bootstrap admin account if it does not exist yet
    pub async fn ensure_default_admin(&self, users: &UsersConfig) -> AppResult<()> {
        if self
            .repository
            .users
            .username_exists(&users.admin_username)
            .await?
        {
            return Ok(());
        }

        let digest = self.hash_password(&users.admin_password)?;
        let admin = self
            .repository
            .users
            .create(&users.admin_username, &digest, None, true)
            .await?;
        tracing::info!(user_id = admin.id, username = %admin.username, "Default admin account created");
        Ok(())
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    fn create_token(&self, user: &User) -> AppResult<String> {
        UserClaims::for_user(user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify a password against the stored digest, upgrading legacy digests
    async fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        if is_legacy_digest(&user.password_digest) {
            if legacy_digest(password) != user.password_digest.to_ascii_lowercase() {
                return Ok(false);
            }
            let upgraded = self.hash_password(password)?;
            self.repository
                .users
                .update_password_digest(user.id, &upgraded)
                .await?;
            tracing::info!(user_id = user.id, "Upgraded legacy password digest");
            return Ok(true);
        }

        let parsed_hash = PasswordHash::new(&user.password_digest)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}

/// Unsalted SHA-256 hex, as stored by older databases
fn legacy_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn is_legacy_digest(digest: &str) -> bool {
    digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, services::test_services};

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let services = test_services(&AppConfig::default()).await;
        let users = &services.users;

        let user = users
            .register(RegisterUser::new("alice", "secret1", "secret1"))
            .await
            .unwrap();
        assert!(!user.is_admin);
        assert_ne!(user.password_digest, "secret1");

        let (token, logged_in) = users.authenticate("alice", "secret1").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let claims = users.verify_token(&token).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.username(), "alice");
        assert!(!claims.is_admin);

        let err = users.authenticate("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let services = test_services(&AppConfig::default()).await;
        let users = &services.users;
        users
            .register(RegisterUser::new("alice", "secret1", "secret1"))
            .await
            .unwrap();

        let err = users
            .register(RegisterUser::new("ALICE", "secret2", "secret2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let services = test_services(&AppConfig::default()).await;
        let users = &services.users;

        for request in [
            RegisterUser::new("al", "secret1", "secret1"),
            RegisterUser::new("alice", "12345", "12345"),
            RegisterUser::new("alice", "secret1", "secret2"),
        ] {
            let err = users.register(request).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(services.repository.users.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_and_empty_input() {
        let services = test_services(&AppConfig::default()).await;
        let err = services.users.authenticate("nobody", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));

        let err = services.users.authenticate("", "").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_default_admin_seeded_once() {
        let config = AppConfig::default();
        let services = test_services(&config).await;
        services.users.ensure_default_admin(&config.users).await.unwrap();
        services.users.ensure_default_admin(&config.users).await.unwrap();
        assert_eq!(services.repository.users.count().await.unwrap(), 1);

        let (_, admin) = services.users.authenticate("admin", "admin123").await.unwrap();
        assert!(admin.is_admin);
    }

    #[tokio::test]
    async fn test_legacy_digest_upgraded_on_login() {
        let services = test_services(&AppConfig::default()).await;
        let repo = &services.repository.users;
        let legacy = legacy_digest("admin123");
        let user = repo.create("librarian", &legacy, None, false).await.unwrap();

        assert!(services.users.authenticate("librarian", "nope").await.is_err());
        services.users.authenticate("librarian", "admin123").await.unwrap();

        let stored = repo.get_by_id(user.id).await.unwrap().password_digest;
        assert!(stored.starts_with("$argon2"));
        services.users.authenticate("librarian", "admin123").await.unwrap();
    }
}
