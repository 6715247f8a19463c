use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use rand::{Rng, distributions::Alphanumeric};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::error::{FieldErrors, ServiceError};
use crate::db::models::{NewUser, UserRow};
use crate::db::repository::{TokenRepository, UserRepository};

const TOKEN_NAME: &str = "auth_token";
const TOKEN_LENGTH: usize = 40;

/// A user together with a freshly issued plaintext token
#[derive(Debug)]
pub struct IssuedToken {
    pub user: UserRow,
    pub token: String,
}

/// Account registration and bearer token lifecycle
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
}

/// Hex SHA-256 of a plaintext token; only the digest is stored
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn invalid_credentials() -> ServiceError {
    ServiceError::invalid_field("email", "The provided credentials are incorrect.")
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<dyn TokenRepository>) -> Self {
        Self { users, tokens }
    }

    async fn issue_token(&self, user: UserRow) -> Result<IssuedToken, ServiceError> {
        let token = generate_token();
        self.tokens
            .insert(user.id, TOKEN_NAME, &hash_token(&token))
            .await?;
        debug!("Issued token for user_id={}", user.id);
        Ok(IssuedToken { user, token })
    }

    /// Create an account and sign it in
    ///
    /// # Business Logic
    /// - Name, email, and password must be present; the password needs at
    ///   least 8 characters and must match its confirmation
    /// - Emails are unique
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<IssuedToken, ServiceError> {
        let name = name.trim();
        let email = email.trim().to_lowercase();

        let mut errors = FieldErrors::new();
        if name.is_empty() {
            errors
                .entry("name".into())
                .or_default()
                .push("The name field is required.".into());
        }
        if email.is_empty() || !email.contains('@') {
            errors
                .entry("email".into())
                .or_default()
                .push("The email field must be a valid email address.".into());
        }
        if password.chars().count() < 8 {
            errors
                .entry("password".into())
                .or_default()
                .push("The password field must be at least 8 characters.".into());
        }
        if password != password_confirmation {
            errors
                .entry("password".into())
                .or_default()
                .push("The password field confirmation does not match.".into());
        }
        if !errors.is_empty() {
            return Err(ServiceError::invalid(errors));
        }

        let new_user = NewUser {
            name: name.to_string(),
            email: email.clone(),
            password_hash: hash_password(password)?,
        };
        let Some(user) = self.users.create(&new_user).await? else {
            warn!("Service: Registration rejected, email taken: {}", email);
            return Err(ServiceError::invalid_field(
                "email",
                "The email has already been taken.",
            ));
        };

        info!("Service: Registered user id={}", user.id);
        self.issue_token(user).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, ServiceError> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &user.password_hash) {
            warn!("Service: Failed login for user id={}", user.id);
            return Err(invalid_credentials());
        }

        info!("Service: User id={} logged in", user.id);
        self.issue_token(user).await
    }

    /// Resolve a plaintext bearer token to its user
    pub async fn authenticate(&self, token: &str) -> Result<UserRow, ServiceError> {
        self.tokens
            .find_user(&hash_token(token))
            .await?
            .ok_or(ServiceError::Unauthenticated)
    }

    /// Revoke one token; other sessions of the same user stay valid
    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        if !self.tokens.delete(&hash_token(token)).await? {
            return Err(ServiceError::Unauthenticated);
        }
        info!("Service: Token revoked");
        Ok(())
    }
}
