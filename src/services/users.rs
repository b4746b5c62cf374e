//! Authentication and profile service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        copy::BorrowedCopy,
        user::{CreateUser, Profile, User, UserClaims},
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

    /// Authenticate by username and password, returning a signed token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<String> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user, password)? {
            tracing::warn!(username, "Failed login attempt");
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        tracing::info!(user_id = user.id, "User logged in");
        UserClaims::for_user(&user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Current user with the number of copies they hold
    pub async fn profile(&self, user_id: i32) -> AppResult<Profile> {
        let user = self.repository.users.get_by_id(user_id).await?;
        let borrowed = self.repository.copies.count_borrowed_by_user(user_id).await?;
        Ok(Profile::new(user, borrowed))
    }

    /// Copies held by the user
    pub async fn borrowed_copies(&self, user_id: i32) -> AppResult<Vec<BorrowedCopy>> {
        self.repository.copies.borrowed_by_user(user_id).await
    }

    /// Create a user account
    pub async fn create_user(&self, data: CreateUser) -> AppResult<Profile> {
        data.validate()?;
        let hash = hash_password(&data.password)?;
        let user = self.repository.users.create(&data, &hash).await?;
        tracing::info!(user_id = user.id, username = %user.username, "Created user");
        Ok(Profile::new(user, 0))
    }

    /// Create the configured staff account if it does not exist yet
    pub async fn ensure_bootstrap_account(&self) -> AppResult<()> {
        let (Some(username), Some(password)) = (
            self.config.bootstrap_username.as_deref(),
            self.config.bootstrap_password.as_deref(),
        ) else {
            return Ok(());
        };

        if self.repository.users.get_by_username(username).await?.is_some() {
            return Ok(());
        }

        let data = CreateUser {
            username: username.to_string(),
            password: password.to_string(),
            first_name: None,
            last_name: None,
            email: None,
            is_staff: true,
        };
        let hash = hash_password(&data.password)?;
        let user = self.repository.users.create(&data, &hash).await?;
        tracing::info!(user_id = user.id, username, "Created bootstrap staff account");
        Ok(())
    }
}

/// Check a password against the user's argon2 hash
fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}
