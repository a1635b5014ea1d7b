use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::project::Project;

/// Repository trait for Project aggregate
///
/// `update` reconciles both the participant rows and the technology rows.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Project>>;

    async fn get_all(&self) -> RepositoryResult<Vec<Project>>;

    /// Insert a new project; `Conflict` if the name is taken
    async fn add(&self, project: &Project) -> RepositoryResult<()>;

    async fn update(&self, project: &Project) -> RepositoryResult<()>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    async fn get_by_name(&self, name: &str) -> RepositoryResult<Option<Project>>;

    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool>;

    /// All projects owned by a team
    async fn get_by_team(&self, team_id: Uuid) -> RepositoryResult<Vec<Project>>;

    /// Number of projects `user_id` participates in
    async fn count_projects_for_member(&self, user_id: Uuid) -> RepositoryResult<usize>;

    /// True if `user_id` manages any project
    async fn is_manager_of_any_project(&self, user_id: Uuid) -> RepositoryResult<bool>;
}
