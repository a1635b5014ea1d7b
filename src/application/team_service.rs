use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use super::errors::{ServiceError, ServiceResult};
use super::scope::{denied, finish, load_team, load_user};
use crate::config::MembershipPolicy;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::repositories::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::team::{Team, TeamRole};

#[derive(Debug, Clone, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
}

/// Partial team update; omitted fields stay as they are
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
}

/// One entry of a batch member add
#[derive(Debug, Clone, Deserialize)]
pub struct MemberRoles {
    pub user_id: Uuid,
    pub roles: BTreeSet<TeamRole>,
}

/// Team use cases
///
/// Every public method runs in its own unit of work: committed when the
/// method returns Ok, rolled back otherwise.
pub struct TeamService {
    uow: Arc<dyn UnitOfWorkFactory>,
    policy: MembershipPolicy,
}

impl TeamService {
    pub fn new(uow: Arc<dyn UnitOfWorkFactory>, policy: MembershipPolicy) -> Self {
        Self { uow, policy }
    }

    pub async fn create_team(&self, actor: Uuid, new_team: NewTeam) -> ServiceResult<Team> {
        let uow = self.uow.begin().await?;
        let outcome = self.create_team_in(uow.as_ref(), actor, new_team).await;
        finish(uow, outcome).await
    }

    async fn create_team_in(
        &self,
        uow: &dyn UnitOfWork,
        actor: Uuid,
        new_team: NewTeam,
    ) -> ServiceResult<Team> {
        load_user(uow, actor).await?;

        if uow.teams().exists_by_name(new_team.name.trim()).await? {
            return Err(ServiceError::AlreadyExists(format!(
                "Team with name {} already exists",
                new_team.name.trim()
            )));
        }
        self.ensure_team_capacity(uow, actor).await?;

        let team = Team::new(new_team.name, actor, new_team.description, new_team.logo)?;
        uow.teams().add(&team).await?;

        tracing::info!(team_id = %team.id(), owner = %actor, "Team created");
        Ok(team)
    }

    pub async fn get_team(&self, team_id: Uuid) -> ServiceResult<Team> {
        let uow = self.uow.begin().await?;
        let outcome = load_team(uow.as_ref(), team_id).await;
        finish(uow, outcome).await
    }

    pub async fn list_teams(&self) -> ServiceResult<Vec<Team>> {
        let uow = self.uow.begin().await?;
        let outcome = uow.teams().get_all().await.map_err(ServiceError::from);
        finish(uow, outcome).await
    }

    pub async fn update_team(
        &self,
        actor: Uuid,
        team_id: Uuid,
        changes: TeamChanges,
    ) -> ServiceResult<Team> {
        let uow = self.uow.begin().await?;
        let outcome = self.update_team_in(uow.as_ref(), actor, team_id, changes).await;
        finish(uow, outcome).await
    }

    async fn update_team_in(
        &self,
        uow: &dyn UnitOfWork,
        actor: Uuid,
        team_id: Uuid,
        changes: TeamChanges,
    ) -> ServiceResult<Team> {
        let mut team = load_team(uow, team_id).await?;
        if !team.is_owner_or_maintainer(actor) {
            return Err(denied(actor, "Only the owner or a maintainer can update the team"));
        }

        if let Some(name) = changes.name.as_deref().map(str::trim) {
            if name != team.name() && uow.teams().exists_by_name(name).await? {
                return Err(ServiceError::AlreadyExists(format!(
                    "Team with name {name} already exists"
                )));
            }
        }

        team.update(changes.name, changes.description, changes.logo)?;
        uow.teams().update(&team).await?;

        tracing::info!(team_id = %team_id, actor = %actor, "Team updated");
        Ok(team)
    }

    /// Deletes a team and, with it, every project the team owns
    pub async fn delete_team(&self, actor: Uuid, team_id: Uuid) -> ServiceResult<()> {
        let uow = self.uow.begin().await?;
        let outcome = delete_team_in(uow.as_ref(), actor, team_id).await;
        finish(uow, outcome).await
    }

    /// Adds several members at once; any failure rejects the whole batch
    pub async fn add_members_batch(
        &self,
        actor: Uuid,
        team_id: Uuid,
        members: Vec<MemberRoles>,
    ) -> ServiceResult<Team> {
        let uow = self.uow.begin().await?;
        let outcome = self
            .add_members_in(uow.as_ref(), actor, team_id, members)
            .await;
        finish(uow, outcome).await
    }

    async fn add_members_in(
        &self,
        uow: &dyn UnitOfWork,
        actor: Uuid,
        team_id: Uuid,
        members: Vec<MemberRoles>,
    ) -> ServiceResult<Team> {
        let mut team = load_team(uow, team_id).await?;
        if !team.is_owner_or_maintainer(actor) {
            return Err(denied(actor, "Only the owner or a maintainer can add members"));
        }

        for member in members {
            load_user(uow, member.user_id).await?;
            self.ensure_team_capacity(uow, member.user_id).await?;
            team.add_member(member.user_id, member.roles)?;
        }
        uow.teams().update(&team).await?;

        tracing::info!(team_id = %team_id, members = team.member_count(), "Team members added");
        Ok(team)
    }

    /// Removes several members at once
    ///
    /// Owners and maintainers may remove anyone but the owner; any member may
    /// remove themselves. Permissions are checked for the whole batch before
    /// the first removal.
    pub async fn remove_members_batch(
        &self,
        actor: Uuid,
        team_id: Uuid,
        user_ids: Vec<Uuid>,
    ) -> ServiceResult<Team> {
        let uow = self.uow.begin().await?;
        let outcome = remove_members_in(uow.as_ref(), actor, team_id, user_ids).await;
        finish(uow, outcome).await
    }

    pub async fn assign_role(
        &self,
        actor: Uuid,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> ServiceResult<Team> {
        self.edit_membership(actor, team_id, |team| team.assign_role(user_id, role))
            .await
    }

    pub async fn revoke_role(
        &self,
        actor: Uuid,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> ServiceResult<Team> {
        self.edit_membership(actor, team_id, |team| team.revoke_role(user_id, role))
            .await
    }

    pub async fn set_member_roles(
        &self,
        actor: Uuid,
        team_id: Uuid,
        user_id: Uuid,
        roles: BTreeSet<TeamRole>,
    ) -> ServiceResult<Team> {
        self.edit_membership(actor, team_id, move |team| {
            team.set_member_roles(user_id, roles)
        })
        .await
    }

    /// Loads the team, requires owner or maintainer, applies `edit`, persists
    async fn edit_membership<F>(&self, actor: Uuid, team_id: Uuid, edit: F) -> ServiceResult<Team>
    where
        F: FnOnce(&mut Team) -> DomainResult<()> + Send,
    {
        let uow = self.uow.begin().await?;
        let outcome = edit_membership_in(uow.as_ref(), actor, team_id, edit).await;
        finish(uow, outcome).await
    }

    async fn ensure_team_capacity(&self, uow: &dyn UnitOfWork, user_id: Uuid) -> ServiceResult<()> {
        let count = uow.teams().count_teams_for_member(user_id).await?;
        if count >= self.policy.max_teams_per_user {
            return Err(DomainError::CapacityExceeded(format!(
                "User {user_id} cannot be a member of more than {} teams",
                self.policy.max_teams_per_user
            ))
            .into());
        }
        Ok(())
    }
}

async fn delete_team_in(uow: &dyn UnitOfWork, actor: Uuid, team_id: Uuid) -> ServiceResult<()> {
    let team = load_team(uow, team_id).await?;
    if team.owner_id() != Some(actor) {
        return Err(denied(actor, "Only the owner can delete the team"));
    }

    uow.teams().delete(team_id).await?;

    tracing::info!(team_id = %team_id, actor = %actor, "Team deleted");
    Ok(())
}

async fn remove_members_in(
    uow: &dyn UnitOfWork,
    actor: Uuid,
    team_id: Uuid,
    user_ids: Vec<Uuid>,
) -> ServiceResult<Team> {
    let mut team = load_team(uow, team_id).await?;

    let can_remove_others = team.is_owner_or_maintainer(actor);
    if user_ids.iter().any(|id| *id != actor) && !can_remove_others {
        return Err(denied(
            actor,
            "Only the owner or a maintainer can remove other members",
        ));
    }

    for user_id in &user_ids {
        team.remove_member(*user_id)?;
    }
    uow.teams().update(&team).await?;

    tracing::info!(team_id = %team_id, removed = user_ids.len(), "Team members removed");
    Ok(team)
}

async fn edit_membership_in<F>(
    uow: &dyn UnitOfWork,
    actor: Uuid,
    team_id: Uuid,
    edit: F,
) -> ServiceResult<Team>
where
    F: FnOnce(&mut Team) -> DomainResult<()> + Send,
{
    let mut team = load_team(uow, team_id).await?;
    if !team.is_owner_or_maintainer(actor) {
        return Err(denied(actor, "Only the owner or a maintainer can change member roles"));
    }

    edit(&mut team)?;
    uow.teams().update(&team).await?;

    tracing::info!(team_id = %team_id, actor = %actor, "Team roles changed");
    Ok(team)
}
