use async_trait::async_trait;

use super::desired_project_repository::DesiredProjectRepository;
use super::errors::RepositoryResult;
use super::project_repository::ProjectRepository;
use super::team_repository::TeamRepository;
use super::user_repository::UserRepository;

/// One transactional scope over every repository
///
/// All repositories handed out by a scope share its transaction, so writes
/// made through any of them become visible together on `commit` and vanish
/// together on `rollback`. A scope dropped without either is rolled back.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> &dyn UserRepository;

    fn teams(&self) -> &dyn TeamRepository;

    fn projects(&self) -> &dyn ProjectRepository;

    fn desired_projects(&self) -> &dyn DesiredProjectRepository;

    /// Make every write in this scope durable
    async fn commit(self: Box<Self>) -> RepositoryResult<()>;

    /// Discard every write in this scope
    async fn rollback(self: Box<Self>) -> RepositoryResult<()>;
}

/// Opens unit-of-work scopes
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    async fn begin(&self) -> RepositoryResult<Box<dyn UnitOfWork>>;
}
