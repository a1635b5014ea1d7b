use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::desired_project::DesiredProject;

#[async_trait]
pub trait DesiredProjectRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<DesiredProject>>;

    async fn get_all(&self) -> RepositoryResult<Vec<DesiredProject>>;

    async fn add(&self, desired: &DesiredProject) -> RepositoryResult<()>;

    async fn update(&self, desired: &DesiredProject) -> RepositoryResult<()>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    async fn get_by_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<DesiredProject>>;

    async fn count_for_owner(&self, owner_id: Uuid) -> RepositoryResult<usize>;
}
