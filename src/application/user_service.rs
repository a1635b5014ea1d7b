use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use super::auth_service::ensure_password_strength;
use super::errors::{ServiceError, ServiceResult};
use super::scope::{denied, finish, hash_password, load_user, verify_password};
use crate::auth::PasswordHasher;
use crate::domain::errors::DomainError;
use crate::domain::repositories::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::user::{Email, PlatformRole, ProfileChanges, User, UserStatus};

/// Partial user update; omitted fields stay as they are
///
/// `status` and `platform_roles` are admin-only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub status: Option<UserStatus>,
    pub platform_roles: Option<BTreeSet<PlatformRole>>,
}

pub struct UserService {
    uow: Arc<dyn UnitOfWorkFactory>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(uow: Arc<dyn UnitOfWorkFactory>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { uow, hasher }
    }

    pub async fn get_user(&self, user_id: Uuid) -> ServiceResult<User> {
        let uow = self.uow.begin().await?;
        let outcome = load_user(uow.as_ref(), user_id).await;
        finish(uow, outcome).await
    }

    pub async fn list_users(&self) -> ServiceResult<Vec<User>> {
        let uow = self.uow.begin().await?;
        let outcome = uow.users().get_all().await.map_err(ServiceError::from);
        finish(uow, outcome).await
    }

    /// Updates a profile; users edit themselves, admins edit anyone
    pub async fn update_user(
        &self,
        actor: Uuid,
        user_id: Uuid,
        changes: UserChanges,
    ) -> ServiceResult<User> {
        let uow = self.uow.begin().await?;
        let outcome = update_user_in(uow.as_ref(), actor, user_id, changes).await;
        finish(uow, outcome).await
    }

    pub async fn ban_user(&self, actor: Uuid, user_id: Uuid) -> ServiceResult<User> {
        let uow = self.uow.begin().await?;
        let outcome = ban_user_in(uow.as_ref(), actor, user_id).await;
        finish(uow, outcome).await
    }

    /// Replaces the actor's own password after checking the current one
    pub async fn change_password(
        &self,
        actor: Uuid,
        current_password: String,
        new_password: String,
    ) -> ServiceResult<()> {
        ensure_password_strength(&new_password)?;

        let uow = self.uow.begin().await?;
        let outcome = self
            .change_password_in(uow.as_ref(), actor, current_password, new_password)
            .await;
        finish(uow, outcome).await
    }

    async fn change_password_in(
        &self,
        uow: &dyn UnitOfWork,
        actor: Uuid,
        current_password: String,
        new_password: String,
    ) -> ServiceResult<()> {
        let mut user = load_user(uow, actor).await?;

        let valid =
            verify_password(&self.hasher, current_password, user.password_hash().to_string())
                .await?;
        if !valid {
            return Err(ServiceError::InvalidCredentials);
        }

        user.set_password_hash(hash_password(&self.hasher, new_password).await?);
        uow.users().update(&user).await?;

        tracing::info!(user_id = %actor, "Password changed");
        Ok(())
    }

    /// Deletes the actor's own account
    ///
    /// Refused while the user owns a team or manages a project, since those
    /// aggregates would be left without their privileged holder.
    pub async fn delete_user(&self, actor: Uuid, user_id: Uuid) -> ServiceResult<()> {
        let uow = self.uow.begin().await?;
        let outcome = delete_user_in(uow.as_ref(), actor, user_id).await;
        finish(uow, outcome).await
    }
}

async fn update_user_in(
    uow: &dyn UnitOfWork,
    actor: Uuid,
    user_id: Uuid,
    changes: UserChanges,
) -> ServiceResult<User> {
    let actor_user = load_user(uow, actor).await?;
    if actor != user_id && !actor_user.is_admin() {
        return Err(denied(actor, "Users can only update their own profile"));
    }
    let admin_fields = changes.status.is_some() || changes.platform_roles.is_some();
    if admin_fields && !actor_user.is_admin() {
        return Err(denied(actor, "Only admins can change status or platform roles"));
    }

    let mut user = if actor == user_id {
        actor_user
    } else {
        load_user(uow, user_id).await?
    };

    if let Some(username) = changes.username.as_deref().map(str::trim) {
        if username != user.username() && uow.users().exists_by_username(username).await? {
            return Err(ServiceError::AlreadyExists(format!(
                "Username {username} is already taken"
            )));
        }
    }
    let email = changes.email.map(Email::new).transpose()?;
    if let Some(email) = &email {
        if email != user.email() && uow.users().exists_by_email(email).await? {
            return Err(ServiceError::AlreadyExists(
                "Email already registered".to_string(),
            ));
        }
    }
    if let Some(roles) = changes.platform_roles {
        user.set_platform_roles(roles)?;
    }

    user.update_profile(ProfileChanges {
        username: changes.username,
        avatar: changes.avatar,
        github: changes.github,
        linkedin: changes.linkedin,
    })?;
    if let Some(email) = email {
        user.change_email(email);
    }
    if let Some(status) = changes.status {
        user.change_status(status);
    }
    uow.users().update(&user).await?;

    tracing::info!(user_id = %user_id, actor = %actor, "User updated");
    Ok(user)
}

async fn ban_user_in(uow: &dyn UnitOfWork, actor: Uuid, user_id: Uuid) -> ServiceResult<User> {
    let actor_user = load_user(uow, actor).await?;
    if !actor_user.is_admin() {
        return Err(denied(actor, "Only admins can ban users"));
    }

    let mut user = load_user(uow, user_id).await?;
    user.ban()?;
    uow.users().update(&user).await?;

    tracing::info!(user_id = %user_id, actor = %actor, "User banned");
    Ok(user)
}

async fn delete_user_in(uow: &dyn UnitOfWork, actor: Uuid, user_id: Uuid) -> ServiceResult<()> {
    if actor != user_id {
        return Err(denied(actor, "Users can only delete their own account"));
    }
    load_user(uow, user_id).await?;

    if uow.teams().is_owner_of_any_team(user_id).await? {
        return Err(DomainError::ForbiddenOperation(
            "Transfer or delete owned teams before deleting the account".to_string(),
        )
        .into());
    }
    if uow.projects().is_manager_of_any_project(user_id).await? {
        return Err(DomainError::ForbiddenOperation(
            "Delete managed projects before deleting the account".to_string(),
        )
        .into());
    }

    uow.users().delete(user_id).await?;

    tracing::info!(user_id = %user_id, "User deleted");
    Ok(())
}
