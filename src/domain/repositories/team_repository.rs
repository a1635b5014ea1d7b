use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::team::Team;

/// Repository trait for Team aggregate
///
/// Defines the contract for persisting and retrieving teams.
/// `get_by_id` returns the team with its full membership resolved, and
/// `update` reconciles the stored membership rows against the aggregate.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Find a team by its ID
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Team>>;

    async fn get_all(&self) -> RepositoryResult<Vec<Team>>;

    /// Insert a new team with its members; `Conflict` if the name is taken
    async fn add(&self, team: &Team) -> RepositoryResult<()>;

    /// Persist the full current state of an existing team
    async fn update(&self, team: &Team) -> RepositoryResult<()>;

    /// Delete a team; its members and projects go with it
    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    async fn get_by_name(&self, name: &str) -> RepositoryResult<Option<Team>>;

    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool>;

    /// True if `user_id` holds the owner role in any team
    async fn is_owner_of_any_team(&self, user_id: Uuid) -> RepositoryResult<bool>;

    /// Number of teams `user_id` belongs to
    async fn count_teams_for_member(&self, user_id: Uuid) -> RepositoryResult<usize>;
}
