use std::collections::BTreeSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::application::NewDesiredProject;
use crate::domain::desired_project::DesiredProject;
use crate::domain::tech_profile::Technology;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDesiredProjectRequest {
    pub description: Option<String>,
    pub amount_of_people: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TechnologyRequest {
    pub technology: Technology,
}

#[derive(Debug, Deserialize)]
pub struct SetTechnologiesRequest {
    pub technologies: BTreeSet<Technology>,
}

#[derive(Debug, Serialize)]
pub struct DesiredProjectResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub description: String,
    pub technologies: BTreeSet<Technology>,
    pub amount_of_people: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl From<&DesiredProject> for DesiredProjectResponse {
    fn from(desired: &DesiredProject) -> Self {
        Self {
            id: desired.id(),
            owner_id: desired.owner_id(),
            description: desired.description().to_string(),
            technologies: desired.technologies().clone(),
            amount_of_people: desired.amount_of_people(),
            created_at: desired.created_at(),
        }
    }
}

/// POST /api/desired-projects
pub async fn create_desired_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<NewDesiredProject>,
) -> Result<(StatusCode, Json<DesiredProjectResponse>), ApiError> {
    let desired = state.desired_projects.create(user.id(), req).await?;
    Ok((StatusCode::CREATED, Json(DesiredProjectResponse::from(&desired))))
}

/// The caller's own postings
///
/// GET /api/desired-projects
pub async fn list_own(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<DesiredProjectResponse>>, ApiError> {
    let postings = state.desired_projects.list_own(user.id()).await?;
    Ok(Json(postings.iter().map(DesiredProjectResponse::from).collect()))
}

/// GET /api/desired-projects/:id
pub async fn get_desired_project(
    State(state): State<AppState>,
    _auth: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DesiredProjectResponse>, ApiError> {
    let desired = state.desired_projects.get(id).await?;
    Ok(Json(DesiredProjectResponse::from(&desired)))
}

/// PATCH /api/desired-projects/:id
pub async fn update_desired_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDesiredProjectRequest>,
) -> Result<Json<DesiredProjectResponse>, ApiError> {
    let desired = state
        .desired_projects
        .update(user.id(), id, req.description, req.amount_of_people)
        .await?;
    Ok(Json(DesiredProjectResponse::from(&desired)))
}

/// POST /api/desired-projects/:id/technologies
pub async fn add_technology(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<TechnologyRequest>,
) -> Result<Json<DesiredProjectResponse>, ApiError> {
    let desired = state
        .desired_projects
        .add_technology(user.id(), id, req.technology)
        .await?;
    Ok(Json(DesiredProjectResponse::from(&desired)))
}

/// DELETE /api/desired-projects/:id/technologies/:technology
pub async fn remove_technology(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, technology)): Path<(Uuid, Technology)>,
) -> Result<Json<DesiredProjectResponse>, ApiError> {
    let desired = state
        .desired_projects
        .remove_technology(user.id(), id, technology)
        .await?;
    Ok(Json(DesiredProjectResponse::from(&desired)))
}

/// PUT /api/desired-projects/:id/technologies
pub async fn set_technologies(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetTechnologiesRequest>,
) -> Result<Json<DesiredProjectResponse>, ApiError> {
    let desired = state
        .desired_projects
        .set_technologies(user.id(), id, req.technologies)
        .await?;
    Ok(Json(DesiredProjectResponse::from(&desired)))
}

/// DELETE /api/desired-projects/:id
pub async fn delete_desired_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.desired_projects.delete(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
