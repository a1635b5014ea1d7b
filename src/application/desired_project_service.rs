use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use super::errors::{ServiceError, ServiceResult};
use super::scope::{denied, finish, load_user};
use crate::config::MembershipPolicy;
use crate::domain::desired_project::DesiredProject;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::repositories::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::tech_profile::{TechProfile, Technology};

#[derive(Debug, Clone, Deserialize)]
pub struct NewDesiredProject {
    pub description: String,
    pub technologies: BTreeSet<Technology>,
    pub amount_of_people: Option<u32>,
}

/// Desired-project postings; only the owner may change or delete one
pub struct DesiredProjectService {
    uow: Arc<dyn UnitOfWorkFactory>,
    policy: MembershipPolicy,
}

impl DesiredProjectService {
    pub fn new(uow: Arc<dyn UnitOfWorkFactory>, policy: MembershipPolicy) -> Self {
        Self { uow, policy }
    }

    pub async fn create(&self, actor: Uuid, new: NewDesiredProject) -> ServiceResult<DesiredProject> {
        let uow = self.uow.begin().await?;
        let outcome = self.create_in(uow.as_ref(), actor, new).await;
        finish(uow, outcome).await
    }

    async fn create_in(
        &self,
        uow: &dyn UnitOfWork,
        actor: Uuid,
        new: NewDesiredProject,
    ) -> ServiceResult<DesiredProject> {
        load_user(uow, actor).await?;

        let count = uow.desired_projects().count_for_owner(actor).await?;
        if count >= self.policy.max_desired_projects_per_user {
            return Err(DomainError::CapacityExceeded(format!(
                "A user cannot publish more than {} desired projects",
                self.policy.max_desired_projects_per_user
            ))
            .into());
        }

        let tech_profile = TechProfile::new(new.description, new.technologies)?;
        let desired = DesiredProject::new(actor, tech_profile, new.amount_of_people)?;
        uow.desired_projects().add(&desired).await?;

        tracing::info!(desired_project_id = %desired.id(), owner = %actor, "Desired project created");
        Ok(desired)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<DesiredProject> {
        let uow = self.uow.begin().await?;
        let outcome = load(uow.as_ref(), id).await;
        finish(uow, outcome).await
    }

    pub async fn list_own(&self, actor: Uuid) -> ServiceResult<Vec<DesiredProject>> {
        let uow = self.uow.begin().await?;
        let outcome = uow
            .desired_projects()
            .get_by_owner(actor)
            .await
            .map_err(ServiceError::from);
        finish(uow, outcome).await
    }

    pub async fn update(
        &self,
        actor: Uuid,
        id: Uuid,
        description: Option<String>,
        amount_of_people: Option<u32>,
    ) -> ServiceResult<DesiredProject> {
        self.edit(actor, id, move |desired| {
            desired.update(description, amount_of_people)
        })
        .await
    }

    pub async fn add_technology(
        &self,
        actor: Uuid,
        id: Uuid,
        technology: Technology,
    ) -> ServiceResult<DesiredProject> {
        self.edit(actor, id, |desired| desired.add_technology(technology))
            .await
    }

    pub async fn remove_technology(
        &self,
        actor: Uuid,
        id: Uuid,
        technology: Technology,
    ) -> ServiceResult<DesiredProject> {
        self.edit(actor, id, |desired| desired.remove_technology(technology))
            .await
    }

    pub async fn set_technologies(
        &self,
        actor: Uuid,
        id: Uuid,
        technologies: BTreeSet<Technology>,
    ) -> ServiceResult<DesiredProject> {
        self.edit(actor, id, move |desired| {
            desired.set_technologies(technologies)
        })
        .await
    }

    pub async fn delete(&self, actor: Uuid, id: Uuid) -> ServiceResult<()> {
        let uow = self.uow.begin().await?;
        let outcome = delete_in(uow.as_ref(), actor, id).await;
        finish(uow, outcome).await
    }

    async fn edit<F>(&self, actor: Uuid, id: Uuid, edit: F) -> ServiceResult<DesiredProject>
    where
        F: FnOnce(&mut DesiredProject) -> DomainResult<()> + Send,
    {
        let uow = self.uow.begin().await?;
        let outcome = edit_in(uow.as_ref(), actor, id, edit).await;
        finish(uow, outcome).await
    }
}

async fn load(uow: &dyn UnitOfWork, id: Uuid) -> ServiceResult<DesiredProject> {
    uow.desired_projects()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Desired project {id} not found")))
}

async fn edit_in<F>(uow: &dyn UnitOfWork, actor: Uuid, id: Uuid, edit: F) -> ServiceResult<DesiredProject>
where
    F: FnOnce(&mut DesiredProject) -> DomainResult<()> + Send,
{
    let mut desired = load(uow, id).await?;
    if !desired.is_owner(actor) {
        return Err(denied(actor, "Only the owner can change a desired project"));
    }

    edit(&mut desired)?;
    uow.desired_projects().update(&desired).await?;
    Ok(desired)
}

async fn delete_in(uow: &dyn UnitOfWork, actor: Uuid, id: Uuid) -> ServiceResult<()> {
    let desired = load(uow, id).await?;
    if !desired.is_owner(actor) {
        return Err(denied(actor, "Only the owner can delete a desired project"));
    }

    uow.desired_projects().delete(id).await?;

    tracing::info!(desired_project_id = %id, "Desired project deleted");
    Ok(())
}
