use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::Mutex;

use super::{
    PostgresDesiredProjectRepository, PostgresProjectRepository, PostgresTeamRepository,
    PostgresUserRepository, SharedTransaction,
};
use crate::domain::repositories::{
    DesiredProjectRepository, ProjectRepository, RepositoryError, RepositoryResult,
    TeamRepository, UnitOfWork, UnitOfWorkFactory, UserRepository,
};

/// Opens one database transaction per unit of work
#[derive(Clone)]
pub struct PgUnitOfWorkFactory {
    pool: PgPool,
}

impl PgUnitOfWorkFactory {
    /// Creates a new PgUnitOfWorkFactory
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PgUnitOfWorkFactory {
    async fn begin(&self) -> RepositoryResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork::new(Arc::new(Mutex::new(Some(tx))))))
    }
}

/// A PostgreSQL transaction exposed as a unit of work
///
/// Dropping the scope without committing drops the transaction, which sqlx
/// rolls back.
pub struct PgUnitOfWork {
    tx: SharedTransaction,
    users: PostgresUserRepository,
    teams: PostgresTeamRepository,
    projects: PostgresProjectRepository,
    desired_projects: PostgresDesiredProjectRepository,
}

impl PgUnitOfWork {
    fn new(tx: SharedTransaction) -> Self {
        Self {
            users: PostgresUserRepository::new(Arc::clone(&tx)),
            teams: PostgresTeamRepository::new(Arc::clone(&tx)),
            projects: PostgresProjectRepository::new(Arc::clone(&tx)),
            desired_projects: PostgresDesiredProjectRepository::new(Arc::clone(&tx)),
            tx,
        }
    }

    async fn take(&self) -> RepositoryResult<sqlx::Transaction<'static, sqlx::Postgres>> {
        self.tx.lock().await.take().ok_or(RepositoryError::ScopeClosed)
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn teams(&self) -> &dyn TeamRepository {
        &self.teams
    }

    fn projects(&self) -> &dyn ProjectRepository {
        &self.projects
    }

    fn desired_projects(&self) -> &dyn DesiredProjectRepository {
        &self.desired_projects
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        self.take().await?.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepositoryResult<()> {
        self.take().await?.rollback().await?;
        Ok(())
    }
}
