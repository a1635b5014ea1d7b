use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::user::{Email, User};

/// Repository trait for User aggregate
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;

    async fn get_all(&self) -> RepositoryResult<Vec<User>>;

    /// Insert a new user; `Conflict` if the email or username is taken
    async fn add(&self, user: &User) -> RepositoryResult<()>;

    /// Persist the full current state of an existing user
    async fn update(&self, user: &User) -> RepositoryResult<()>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    /// Find a user by email address
    async fn get_by_email(&self, email: &Email) -> RepositoryResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> RepositoryResult<bool>;

    async fn exists_by_username(&self, username: &str) -> RepositoryResult<bool>;
}
