// Transaction scope helpers shared by the services
// A service opens a unit of work, runs its use case against it, then hands
// the outcome to `finish`, which commits on success and rolls back otherwise.

use std::sync::Arc;

use uuid::Uuid;

use super::errors::{ServiceError, ServiceResult};
use crate::auth::PasswordHasher;
use crate::domain::project::Project;
use crate::domain::repositories::UnitOfWork;
use crate::domain::team::Team;
use crate::domain::user::User;

/// Commits `uow` if `outcome` is Ok, rolls it back otherwise
pub(crate) async fn finish<T>(
    uow: Box<dyn UnitOfWork>,
    outcome: ServiceResult<T>,
) -> ServiceResult<T> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::error!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

pub(crate) async fn load_user(uow: &dyn UnitOfWork, user_id: Uuid) -> ServiceResult<User> {
    uow.users()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User {user_id} not found")))
}

pub(crate) async fn load_team(uow: &dyn UnitOfWork, team_id: Uuid) -> ServiceResult<Team> {
    uow.teams()
        .get_by_id(team_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Team {team_id} not found")))
}

pub(crate) async fn load_project(uow: &dyn UnitOfWork, project_id: Uuid) -> ServiceResult<Project> {
    uow.projects()
        .get_by_id(project_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Project {project_id} not found")))
}

/// Logs and builds an AccessDenied error
pub(crate) fn denied(actor: Uuid, message: &str) -> ServiceError {
    tracing::warn!(actor = %actor, "{}", message);
    ServiceError::AccessDenied(message.to_string())
}

// bcrypt is CPU-bound; keep it off the async workers.

pub(crate) async fn hash_password(
    hasher: &Arc<dyn PasswordHasher>,
    password: String,
) -> ServiceResult<String> {
    let hasher = Arc::clone(hasher);
    let digest = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))??;
    Ok(digest)
}

pub(crate) async fn verify_password(
    hasher: &Arc<dyn PasswordHasher>,
    password: String,
    digest: String,
) -> ServiceResult<bool> {
    let hasher = Arc::clone(hasher);
    let valid = tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))??;
    Ok(valid)
}
