use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::errors::{ServiceError, ServiceResult};
use super::scope::{denied, finish, hash_password, load_user, verify_password};
use crate::auth::{PasswordHasher, TokenKind, TokenService};
use crate::domain::repositories::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::user::{Email, User};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Access and refresh tokens handed to a client
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

/// Registration, login and token handling
pub struct AuthService {
    uow: Arc<dyn UnitOfWorkFactory>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
}

impl AuthService {
    pub fn new(
        uow: Arc<dyn UnitOfWorkFactory>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            uow,
            hasher,
            tokens,
        }
    }

    /// Registers a new user and signs them in
    ///
    /// # Errors
    /// - `Validation` if the password is shorter than [`MIN_PASSWORD_LEN`]
    /// - `Domain(Validation)` for a malformed email or username
    /// - `AlreadyExists` if the email or username is taken
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> ServiceResult<TokenPair> {
        ensure_password_strength(&password)?;
        let email = Email::new(email)?;
        let password_hash = hash_password(&self.hasher, password).await?;

        let uow = self.uow.begin().await?;
        let outcome = register_in(uow.as_ref(), username, email, password_hash).await;
        let user = finish(uow, outcome).await?;

        tracing::info!(user_id = %user.id(), "User registered");
        self.issue_pair(user.id())
    }

    /// Exchanges credentials for a token pair
    ///
    /// Unknown emails and wrong passwords both yield `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: String) -> ServiceResult<TokenPair> {
        let email = Email::new(email).map_err(|_| ServiceError::InvalidCredentials)?;

        let uow = self.uow.begin().await?;
        let outcome = uow
            .users()
            .get_by_email(&email)
            .await
            .map_err(ServiceError::from);
        let user = finish(uow, outcome)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let valid = verify_password(&self.hasher, password, user.password_hash().to_string()).await?;
        if !valid {
            tracing::warn!(user_id = %user.id(), "Failed login attempt");
            return Err(ServiceError::InvalidCredentials);
        }
        if user.is_banned() {
            return Err(denied(user.id(), "Account is banned"));
        }

        tracing::info!(user_id = %user.id(), "User logged in");
        self.issue_pair(user.id())
    }

    /// Issues a fresh access token for a valid refresh token
    pub async fn refresh_access_token(&self, refresh_token: &str) -> ServiceResult<TokenPair> {
        let claims = self.tokens.decode(refresh_token, TokenKind::Refresh)?;
        let user = self.active_user(claims.sub).await?;

        Ok(TokenPair {
            access_token: self.tokens.issue(user.id(), TokenKind::Access)?,
            refresh_token: refresh_token.to_string(),
            token_type: "bearer",
        })
    }

    /// Resolves an access token to the current user
    pub async fn authenticate(&self, access_token: &str) -> ServiceResult<User> {
        let claims = self.tokens.decode(access_token, TokenKind::Access)?;
        self.active_user(claims.sub).await
    }

    async fn active_user(&self, user_id: Uuid) -> ServiceResult<User> {
        let uow = self.uow.begin().await?;
        let outcome = load_user(uow.as_ref(), user_id).await;
        let user = finish(uow, outcome).await.map_err(|err| match err {
            // Token for a user that no longer exists
            ServiceError::NotFound(_) => ServiceError::InvalidToken,
            other => other,
        })?;

        if user.is_banned() {
            return Err(denied(user.id(), "Account is banned"));
        }
        Ok(user)
    }

    fn issue_pair(&self, user_id: Uuid) -> ServiceResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.tokens.issue(user_id, TokenKind::Access)?,
            refresh_token: self.tokens.issue(user_id, TokenKind::Refresh)?,
            token_type: "bearer",
        })
    }
}

pub(crate) fn ensure_password_strength(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

async fn register_in(
    uow: &dyn UnitOfWork,
    username: String,
    email: Email,
    password_hash: String,
) -> ServiceResult<User> {
    if uow.users().exists_by_email(&email).await? {
        return Err(ServiceError::AlreadyExists(
            "Email already registered".to_string(),
        ));
    }
    if uow.users().exists_by_username(username.trim()).await? {
        return Err(ServiceError::AlreadyExists(
            "Username already taken".to_string(),
        ));
    }

    let user = User::new(username, email, password_hash)?;
    uow.users().add(&user).await?;
    Ok(user)
}
