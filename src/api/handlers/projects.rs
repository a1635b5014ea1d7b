use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::application::{NewProject, ParticipantRoles};
use crate::domain::project::{Project, ProjectChanges, ProjectParticipant, ProjectRole, ProjectStatus};
use crate::domain::tech_profile::Technology;

#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub url: Option<String>,
}

impl From<UpdateProjectRequest> for ProjectChanges {
    fn from(req: UpdateProjectRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            logo: req.logo,
            url: req.url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: ProjectStatus,
}

#[derive(Debug, Deserialize)]
pub struct TechnologyRequest {
    pub technology: Technology,
}

#[derive(Debug, Deserialize)]
pub struct SetTechnologiesRequest {
    pub technologies: BTreeSet<Technology>,
}

#[derive(Debug, Deserialize)]
pub struct AddParticipantsRequest {
    pub participants: Vec<ParticipantRoles>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveParticipantsRequest {
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: ProjectRole,
}

#[derive(Debug, Deserialize)]
pub struct SetRolesRequest {
    pub roles: BTreeSet<ProjectRole>,
}

#[derive(Debug, Serialize)]
pub struct ParticipantResponse {
    pub user_id: Uuid,
    pub roles: BTreeSet<ProjectRole>,
}

impl From<&ProjectParticipant> for ParticipantResponse {
    fn from(participant: &ProjectParticipant) -> Self {
        Self {
            user_id: participant.user_id(),
            roles: participant.roles().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub team_id: Uuid,
    pub status: ProjectStatus,
    pub description: String,
    pub technologies: BTreeSet<Technology>,
    pub logo: Option<String>,
    pub url: Option<String>,
    pub manager_id: Option<Uuid>,
    pub participants: Vec<ParticipantResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<&Project> for ProjectResponse {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id(),
            name: project.name().to_string(),
            team_id: project.team_id(),
            status: project.status(),
            description: project.description().to_string(),
            technologies: project.technologies().clone(),
            logo: project.logo().map(str::to_string),
            url: project.url().map(str::to_string),
            manager_id: project.manager_id(),
            participants: project.participants().map(ParticipantResponse::from).collect(),
            created_at: project.created_at(),
        }
    }
}

/// Create a project inside a team; the caller becomes its manager
///
/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<NewProject>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    let project = state.projects.create_project(user.id(), req).await?;
    Ok((StatusCode::CREATED, Json(ProjectResponse::from(&project))))
}

/// List projects, or look one up with `?name=`
///
/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    _auth: CurrentUser,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = match query.name {
        Some(name) => vec![state.projects.get_project_by_name(&name).await?],
        None => state.projects.list_projects().await?,
    };
    Ok(Json(projects.iter().map(ProjectResponse::from).collect()))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    _auth: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state.projects.get_project(id).await?;
    Ok(Json(ProjectResponse::from(&project)))
}

/// PATCH /api/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .projects
        .update_project(user.id(), id, req.into())
        .await?;
    Ok(Json(ProjectResponse::from(&project)))
}

/// PUT /api/projects/:id/status
pub async fn change_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state.projects.change_status(user.id(), id, req.status).await?;
    Ok(Json(ProjectResponse::from(&project)))
}

/// DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.projects.delete_project(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/projects/:id/technologies
pub async fn add_technology(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<TechnologyRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .projects
        .add_technology(user.id(), id, req.technology)
        .await?;
    Ok(Json(ProjectResponse::from(&project)))
}

/// DELETE /api/projects/:id/technologies/:technology
pub async fn remove_technology(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, technology)): Path<(Uuid, Technology)>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .projects
        .remove_technology(user.id(), id, technology)
        .await?;
    Ok(Json(ProjectResponse::from(&project)))
}

/// PUT /api/projects/:id/technologies
pub async fn set_technologies(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetTechnologiesRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .projects
        .set_technologies(user.id(), id, req.technologies)
        .await?;
    Ok(Json(ProjectResponse::from(&project)))
}

/// POST /api/projects/:id/participants
pub async fn add_participants(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AddParticipantsRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .projects
        .add_participants_batch(user.id(), id, req.participants)
        .await?;
    Ok(Json(ProjectResponse::from(&project)))
}

/// DELETE /api/projects/:id/participants
pub async fn remove_participants(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RemoveParticipantsRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .projects
        .remove_participants_batch(user.id(), id, req.user_ids)
        .await?;
    Ok(Json(ProjectResponse::from(&project)))
}

/// POST /api/projects/:id/participants/:user_id/roles
pub async fn assign_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, participant_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .projects
        .assign_role(user.id(), id, participant_id, req.role)
        .await?;
    Ok(Json(ProjectResponse::from(&project)))
}

/// DELETE /api/projects/:id/participants/:user_id/roles/:role
pub async fn revoke_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, participant_id, role)): Path<(Uuid, Uuid, ProjectRole)>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .projects
        .revoke_role(user.id(), id, participant_id, role)
        .await?;
    Ok(Json(ProjectResponse::from(&project)))
}

/// PUT /api/projects/:id/participants/:user_id/roles
pub async fn set_participant_roles(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, participant_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SetRolesRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .projects
        .set_participant_roles(user.id(), id, participant_id, req.roles)
        .await?;
    Ok(Json(ProjectResponse::from(&project)))
}
