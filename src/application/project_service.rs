use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use super::errors::{ServiceError, ServiceResult};
use super::scope::{denied, finish, load_project, load_team, load_user};
use crate::config::MembershipPolicy;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::project::{Project, ProjectChanges, ProjectRole, ProjectStatus};
use crate::domain::repositories::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::tech_profile::{TechProfile, Technology};

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub team_id: Uuid,
    pub description: String,
    pub technologies: BTreeSet<Technology>,
    pub logo: Option<String>,
    pub url: Option<String>,
}

/// One entry of a batch participant add
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantRoles {
    pub user_id: Uuid,
    pub roles: BTreeSet<ProjectRole>,
}

/// Who may run a project edit
#[derive(Debug, Clone, Copy)]
enum Gate {
    Manager,
    ManagerOrDeveloper,
}

impl Gate {
    fn allows(self, project: &Project, actor: Uuid) -> bool {
        match self {
            Gate::Manager => project.is_manager(actor),
            Gate::ManagerOrDeveloper => project.is_manager_or_developer(actor),
        }
    }

    fn denial(self) -> &'static str {
        match self {
            Gate::Manager => "Only the project manager can perform this action",
            Gate::ManagerOrDeveloper => {
                "Only the project manager or a developer can change the stack"
            }
        }
    }
}

/// Project use cases, one unit of work per call
pub struct ProjectService {
    uow: Arc<dyn UnitOfWorkFactory>,
    policy: MembershipPolicy,
}

impl ProjectService {
    pub fn new(uow: Arc<dyn UnitOfWorkFactory>, policy: MembershipPolicy) -> Self {
        Self { uow, policy }
    }

    /// Creates a project inside a team; the creator becomes its manager
    ///
    /// # Errors
    /// - `NotFound` if the team does not exist
    /// - `AccessDenied` unless the creator is the team's owner or a maintainer
    /// - `AlreadyExists` if the name is taken
    /// - `CapacityExceeded` if the creator is at the per-user project ceiling
    pub async fn create_project(&self, actor: Uuid, new_project: NewProject) -> ServiceResult<Project> {
        let uow = self.uow.begin().await?;
        let outcome = self.create_project_in(uow.as_ref(), actor, new_project).await;
        finish(uow, outcome).await
    }

    async fn create_project_in(
        &self,
        uow: &dyn UnitOfWork,
        actor: Uuid,
        new_project: NewProject,
    ) -> ServiceResult<Project> {
        let team = load_team(uow, new_project.team_id).await?;
        if !team.is_owner_or_maintainer(actor) {
            return Err(denied(
                actor,
                "Only the team owner or a maintainer can create a project",
            ));
        }

        let name = new_project.name.trim();
        if uow.projects().exists_by_name(name).await? {
            return Err(ServiceError::AlreadyExists(format!(
                "Project with name {name} already exists"
            )));
        }
        self.ensure_project_capacity(uow, actor).await?;

        let tech_profile = TechProfile::new(new_project.description, new_project.technologies)?;
        let project = Project::new(
            new_project.name,
            team.id(),
            actor,
            tech_profile,
            new_project.logo,
            new_project.url,
        )?;
        uow.projects().add(&project).await?;

        tracing::info!(project_id = %project.id(), team_id = %team.id(), manager = %actor, "Project created");
        Ok(project)
    }

    pub async fn get_project(&self, project_id: Uuid) -> ServiceResult<Project> {
        let uow = self.uow.begin().await?;
        let outcome = load_project(uow.as_ref(), project_id).await;
        finish(uow, outcome).await
    }

    pub async fn get_project_by_name(&self, name: &str) -> ServiceResult<Project> {
        let uow = self.uow.begin().await?;
        let outcome = match uow.projects().get_by_name(name).await {
            Ok(Some(project)) => Ok(project),
            Ok(None) => Err(ServiceError::NotFound(format!(
                "Project with name {name} not found"
            ))),
            Err(err) => Err(err.into()),
        };
        finish(uow, outcome).await
    }

    pub async fn list_projects(&self) -> ServiceResult<Vec<Project>> {
        let uow = self.uow.begin().await?;
        let outcome = uow.projects().get_all().await.map_err(ServiceError::from);
        finish(uow, outcome).await
    }

    pub async fn update_project(
        &self,
        actor: Uuid,
        project_id: Uuid,
        changes: ProjectChanges,
    ) -> ServiceResult<Project> {
        let uow = self.uow.begin().await?;
        let outcome = update_project_in(uow.as_ref(), actor, project_id, changes).await;
        finish(uow, outcome).await
    }

    pub async fn change_status(
        &self,
        actor: Uuid,
        project_id: Uuid,
        status: ProjectStatus,
    ) -> ServiceResult<Project> {
        self.edit(actor, project_id, Gate::Manager, |project| {
            project.change_status(status)
        })
        .await
    }

    pub async fn delete_project(&self, actor: Uuid, project_id: Uuid) -> ServiceResult<()> {
        let uow = self.uow.begin().await?;
        let outcome = delete_project_in(uow.as_ref(), actor, project_id).await;
        finish(uow, outcome).await
    }

    // ===== Technologies =====

    pub async fn add_technology(
        &self,
        actor: Uuid,
        project_id: Uuid,
        technology: Technology,
    ) -> ServiceResult<Project> {
        self.edit(actor, project_id, Gate::ManagerOrDeveloper, |project| {
            project.add_technology(technology)
        })
        .await
    }

    pub async fn remove_technology(
        &self,
        actor: Uuid,
        project_id: Uuid,
        technology: Technology,
    ) -> ServiceResult<Project> {
        self.edit(actor, project_id, Gate::ManagerOrDeveloper, |project| {
            project.remove_technology(technology)
        })
        .await
    }

    pub async fn set_technologies(
        &self,
        actor: Uuid,
        project_id: Uuid,
        technologies: BTreeSet<Technology>,
    ) -> ServiceResult<Project> {
        self.edit(actor, project_id, Gate::ManagerOrDeveloper, move |project| {
            project.set_technologies(technologies)
        })
        .await
    }

    // ===== Participants =====

    /// Adds several participants at once; any failure rejects the whole batch
    ///
    /// Each user must exist, already belong to the project's team and be
    /// below the per-user project ceiling.
    pub async fn add_participants_batch(
        &self,
        actor: Uuid,
        project_id: Uuid,
        participants: Vec<ParticipantRoles>,
    ) -> ServiceResult<Project> {
        let uow = self.uow.begin().await?;
        let outcome = self
            .add_participants_in(uow.as_ref(), actor, project_id, participants)
            .await;
        finish(uow, outcome).await
    }

    async fn add_participants_in(
        &self,
        uow: &dyn UnitOfWork,
        actor: Uuid,
        project_id: Uuid,
        participants: Vec<ParticipantRoles>,
    ) -> ServiceResult<Project> {
        let mut project = load_project(uow, project_id).await?;
        if !project.is_manager(actor) {
            return Err(denied(actor, Gate::Manager.denial()));
        }
        let team = load_team(uow, project.team_id()).await?;

        for participant in participants {
            load_user(uow, participant.user_id).await?;
            if !team.is_member(participant.user_id) {
                return Err(ServiceError::Validation(format!(
                    "User {} is not a member of team {}",
                    participant.user_id,
                    team.name()
                )));
            }
            self.ensure_project_capacity(uow, participant.user_id).await?;
            project.add_participant(participant.user_id, participant.roles)?;
        }
        uow.projects().update(&project).await?;

        tracing::info!(
            project_id = %project_id,
            participants = project.participant_count(),
            "Project participants added"
        );
        Ok(project)
    }

    /// Removes several participants; the manager may remove anyone but
    /// themselves, everyone else only themselves
    pub async fn remove_participants_batch(
        &self,
        actor: Uuid,
        project_id: Uuid,
        user_ids: Vec<Uuid>,
    ) -> ServiceResult<Project> {
        let uow = self.uow.begin().await?;
        let outcome = remove_participants_in(uow.as_ref(), actor, project_id, user_ids).await;
        finish(uow, outcome).await
    }

    pub async fn assign_role(
        &self,
        actor: Uuid,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> ServiceResult<Project> {
        self.edit(actor, project_id, Gate::Manager, |project| {
            project.assign_role_to_participant(user_id, role)
        })
        .await
    }

    pub async fn revoke_role(
        &self,
        actor: Uuid,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> ServiceResult<Project> {
        self.edit(actor, project_id, Gate::Manager, |project| {
            project.revoke_role_from_participant(user_id, role)
        })
        .await
    }

    pub async fn set_participant_roles(
        &self,
        actor: Uuid,
        project_id: Uuid,
        user_id: Uuid,
        roles: BTreeSet<ProjectRole>,
    ) -> ServiceResult<Project> {
        self.edit(actor, project_id, Gate::Manager, move |project| {
            project.set_participant_roles(user_id, roles)
        })
        .await
    }

    async fn edit<F>(&self, actor: Uuid, project_id: Uuid, gate: Gate, edit: F) -> ServiceResult<Project>
    where
        F: FnOnce(&mut Project) -> DomainResult<()> + Send,
    {
        let uow = self.uow.begin().await?;
        let outcome = edit_in(uow.as_ref(), actor, project_id, gate, edit).await;
        finish(uow, outcome).await
    }

    async fn ensure_project_capacity(&self, uow: &dyn UnitOfWork, user_id: Uuid) -> ServiceResult<()> {
        let count = uow.projects().count_projects_for_member(user_id).await?;
        if count >= self.policy.max_projects_per_user {
            return Err(DomainError::CapacityExceeded(format!(
                "User {user_id} cannot participate in more than {} projects",
                self.policy.max_projects_per_user
            ))
            .into());
        }
        Ok(())
    }
}

async fn update_project_in(
    uow: &dyn UnitOfWork,
    actor: Uuid,
    project_id: Uuid,
    changes: ProjectChanges,
) -> ServiceResult<Project> {
    let mut project = load_project(uow, project_id).await?;
    if !project.is_manager(actor) {
        return Err(denied(actor, Gate::Manager.denial()));
    }

    if let Some(name) = changes.name.as_deref().map(str::trim) {
        if name != project.name() && uow.projects().exists_by_name(name).await? {
            return Err(ServiceError::AlreadyExists(format!(
                "Project with name {name} already exists"
            )));
        }
    }

    project.update(changes)?;
    uow.projects().update(&project).await?;

    tracing::info!(project_id = %project_id, actor = %actor, "Project updated");
    Ok(project)
}

async fn delete_project_in(uow: &dyn UnitOfWork, actor: Uuid, project_id: Uuid) -> ServiceResult<()> {
    let project = load_project(uow, project_id).await?;
    if !project.is_manager(actor) {
        return Err(denied(actor, Gate::Manager.denial()));
    }

    uow.projects().delete(project_id).await?;

    tracing::info!(project_id = %project_id, actor = %actor, "Project deleted");
    Ok(())
}

async fn remove_participants_in(
    uow: &dyn UnitOfWork,
    actor: Uuid,
    project_id: Uuid,
    user_ids: Vec<Uuid>,
) -> ServiceResult<Project> {
    let mut project = load_project(uow, project_id).await?;

    if user_ids.iter().any(|id| *id != actor) && !project.is_manager(actor) {
        return Err(denied(
            actor,
            "Only the project manager can remove other participants",
        ));
    }

    for user_id in &user_ids {
        project.remove_participant(*user_id)?;
    }
    uow.projects().update(&project).await?;

    tracing::info!(project_id = %project_id, removed = user_ids.len(), "Project participants removed");
    Ok(project)
}

async fn edit_in<F>(
    uow: &dyn UnitOfWork,
    actor: Uuid,
    project_id: Uuid,
    gate: Gate,
    edit: F,
) -> ServiceResult<Project>
where
    F: FnOnce(&mut Project) -> DomainResult<()> + Send,
{
    let mut project = load_project(uow, project_id).await?;
    if !gate.allows(&project, actor) {
        return Err(denied(actor, gate.denial()));
    }

    edit(&mut project)?;
    uow.projects().update(&project).await?;

    tracing::info!(project_id = %project_id, actor = %actor, "Project changed");
    Ok(project)
}
