use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{connection, parse_set, parse_text, to_texts, SharedTransaction};
use crate::domain::repositories::{RepositoryError, RepositoryResult, UserRepository};
use crate::domain::user::{Email, User};

const SELECT_USER: &str = r#"
    SELECT id, username, email, password_hash, avatar, github, linkedin,
           status, platform_roles, created_at
    FROM users
"#;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    avatar: Option<String>,
    github: Option<String>,
    linkedin: Option<String>,
    status: String,
    platform_roles: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::new(row.email).map_err(|e| RepositoryError::Corrupt(e.to_string()))?;
        Ok(User::from_persistence(
            row.id,
            row.username,
            email,
            row.password_hash,
            row.avatar,
            row.github,
            row.linkedin,
            parse_text(&row.status)?,
            parse_set(row.platform_roles)?,
            row.created_at,
        ))
    }
}

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    tx: SharedTransaction,
}

impl PostgresUserRepository {
    pub(super) fn new(tx: SharedTransaction) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let mut slot = self.tx.lock().await;
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(connection(&mut slot)?)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_all(&self) -> RepositoryResult<Vec<User>> {
        let mut slot = self.tx.lock().await;
        let rows = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} ORDER BY created_at"))
            .fetch_all(connection(&mut slot)?)
            .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn add(&self, user: &User) -> RepositoryResult<()> {
        let mut slot = self.tx.lock().await;
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, avatar, github, linkedin,
                status, platform_roles, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id())
        .bind(user.username())
        .bind(user.email().as_str())
        .bind(user.password_hash())
        .bind(user.avatar())
        .bind(user.github())
        .bind(user.linkedin())
        .bind(user.status().as_str())
        .bind(to_texts(user.platform_roles()))
        .bind(user.created_at())
        .execute(connection(&mut slot)?)
        .await?;

        Ok(())
    }

    async fn update(&self, user: &User) -> RepositoryResult<()> {
        let mut slot = self.tx.lock().await;
        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = $2,
                email = $3,
                password_hash = $4,
                avatar = $5,
                github = $6,
                linkedin = $7,
                status = $8,
                platform_roles = $9
            WHERE id = $1
            "#,
        )
        .bind(user.id())
        .bind(user.username())
        .bind(user.email().as_str())
        .bind(user.password_hash())
        .bind(user.avatar())
        .bind(user.github())
        .bind(user.linkedin())
        .bind(user.status().as_str())
        .bind(to_texts(user.platform_roles()))
        .execute(connection(&mut slot)?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "user",
                id: user.id(),
            });
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut slot = self.tx.lock().await;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(connection(&mut slot)?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "user", id });
        }
        Ok(())
    }

    async fn get_by_email(&self, email: &Email) -> RepositoryResult<Option<User>> {
        let mut slot = self.tx.lock().await;
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(connection(&mut slot)?)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> RepositoryResult<bool> {
        let mut slot = self.tx.lock().await;
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(connection(&mut slot)?)
        .await?;

        Ok(exists)
    }

    async fn exists_by_username(&self, username: &str) -> RepositoryResult<bool> {
        let mut slot = self.tx.lock().await;
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(connection(&mut slot)?)
        .await?;

        Ok(exists)
    }
}
