// Repository adapters over a scope's working copy of the tables

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use super::tables::Tables;
use crate::domain::desired_project::DesiredProject;
use crate::domain::project::{Project, ProjectRole};
use crate::domain::repositories::{
    DesiredProjectRepository, ProjectRepository, RepositoryResult, TeamRepository,
    UserRepository,
};
use crate::domain::team::{Team, TeamRole};
use crate::domain::user::{Email, User};

pub(super) type WorkingCopy = Arc<Mutex<Tables>>;

pub(super) struct MemoryUserRepository {
    pub(super) work: WorkingCopy,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(self.work.lock().user(id))
    }

    async fn get_all(&self) -> RepositoryResult<Vec<User>> {
        Ok(self.work.lock().all_users())
    }

    async fn add(&self, user: &User) -> RepositoryResult<()> {
        self.work.lock().put_user(user, true)
    }

    async fn update(&self, user: &User) -> RepositoryResult<()> {
        self.work.lock().put_user(user, false)
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        self.work.lock().delete_user(id)
    }

    async fn get_by_email(&self, email: &Email) -> RepositoryResult<Option<User>> {
        Ok(self.work.lock().find_user(|user| user.email() == email))
    }

    async fn exists_by_email(&self, email: &Email) -> RepositoryResult<bool> {
        Ok(self.work.lock().find_user(|user| user.email() == email).is_some())
    }

    async fn exists_by_username(&self, username: &str) -> RepositoryResult<bool> {
        Ok(self
            .work
            .lock()
            .find_user(|user| user.username() == username)
            .is_some())
    }
}

pub(super) struct MemoryTeamRepository {
    pub(super) work: WorkingCopy,
}

#[async_trait]
impl TeamRepository for MemoryTeamRepository {
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Team>> {
        Ok(self.work.lock().team(id))
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Team>> {
        Ok(self.work.lock().all_teams())
    }

    async fn add(&self, team: &Team) -> RepositoryResult<()> {
        self.work.lock().put_team(team, true)
    }

    async fn update(&self, team: &Team) -> RepositoryResult<()> {
        self.work.lock().put_team(team, false)
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        self.work.lock().delete_team(id)
    }

    async fn get_by_name(&self, name: &str) -> RepositoryResult<Option<Team>> {
        let tables = self.work.lock();
        Ok(tables.team_id_by_name(name).and_then(|id| tables.team(id)))
    }

    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool> {
        Ok(self.work.lock().team_id_by_name(name).is_some())
    }

    async fn is_owner_of_any_team(&self, user_id: Uuid) -> RepositoryResult<bool> {
        Ok(self
            .work
            .lock()
            .team_memberships(user_id)
            .any(|roles| roles.contains(&TeamRole::Owner)))
    }

    async fn count_teams_for_member(&self, user_id: Uuid) -> RepositoryResult<usize> {
        Ok(self.work.lock().team_memberships(user_id).count())
    }
}

pub(super) struct MemoryProjectRepository {
    pub(super) work: WorkingCopy,
}

#[async_trait]
impl ProjectRepository for MemoryProjectRepository {
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Project>> {
        Ok(self.work.lock().project(id))
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Project>> {
        Ok(self.work.lock().all_projects())
    }

    async fn add(&self, project: &Project) -> RepositoryResult<()> {
        self.work.lock().put_project(project, true)
    }

    async fn update(&self, project: &Project) -> RepositoryResult<()> {
        self.work.lock().put_project(project, false)
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        self.work.lock().delete_project(id)
    }

    async fn get_by_name(&self, name: &str) -> RepositoryResult<Option<Project>> {
        let tables = self.work.lock();
        Ok(tables
            .project_id_by_name(name)
            .and_then(|id| tables.project(id)))
    }

    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool> {
        Ok(self.work.lock().project_id_by_name(name).is_some())
    }

    async fn get_by_team(&self, team_id: Uuid) -> RepositoryResult<Vec<Project>> {
        Ok(self.work.lock().projects_of_team(team_id))
    }

    async fn count_projects_for_member(&self, user_id: Uuid) -> RepositoryResult<usize> {
        Ok(self.work.lock().participations(user_id).count())
    }

    async fn is_manager_of_any_project(&self, user_id: Uuid) -> RepositoryResult<bool> {
        Ok(self
            .work
            .lock()
            .participations(user_id)
            .any(|roles| roles.contains(&ProjectRole::Manager)))
    }
}

pub(super) struct MemoryDesiredProjectRepository {
    pub(super) work: WorkingCopy,
}

#[async_trait]
impl DesiredProjectRepository for MemoryDesiredProjectRepository {
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<DesiredProject>> {
        Ok(self.work.lock().desired_project(id))
    }

    async fn get_all(&self) -> RepositoryResult<Vec<DesiredProject>> {
        Ok(self.work.lock().desired_projects_where(|_| true))
    }

    async fn add(&self, desired: &DesiredProject) -> RepositoryResult<()> {
        self.work.lock().put_desired_project(desired, true)
    }

    async fn update(&self, desired: &DesiredProject) -> RepositoryResult<()> {
        self.work.lock().put_desired_project(desired, false)
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        self.work.lock().delete_desired_project(id)
    }

    async fn get_by_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<DesiredProject>> {
        Ok(self
            .work
            .lock()
            .desired_projects_where(|owner| owner == owner_id))
    }

    async fn count_for_owner(&self, owner_id: Uuid) -> RepositoryResult<usize> {
        Ok(self
            .work
            .lock()
            .desired_projects_where(|owner| owner == owner_id)
            .len())
    }
}
