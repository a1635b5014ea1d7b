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
use crate::application::{MemberRoles, NewTeam, TeamChanges};
use crate::domain::team::{Team, TeamMember, TeamRole};

#[derive(Debug, Deserialize)]
pub struct AddMembersRequest {
    pub members: Vec<MemberRoles>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveMembersRequest {
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: TeamRole,
}

#[derive(Debug, Deserialize)]
pub struct SetRolesRequest {
    pub roles: BTreeSet<TeamRole>,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub roles: BTreeSet<TeamRole>,
}

impl From<&TeamMember> for MemberResponse {
    fn from(member: &TeamMember) -> Self {
        Self {
            user_id: member.user_id(),
            roles: member.roles().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub owner_id: Option<Uuid>,
    pub members: Vec<MemberResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id(),
            name: team.name().to_string(),
            description: team.description().map(str::to_string),
            logo: team.logo().map(str::to_string),
            owner_id: team.owner_id(),
            members: team.members().map(MemberResponse::from).collect(),
            created_at: team.created_at(),
        }
    }
}

/// Create a new team owned by the caller
///
/// POST /api/teams
pub async fn create_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<NewTeam>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    let team = state.teams.create_team(user.id(), req).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse::from(&team))))
}

/// GET /api/teams
pub async fn list_teams(
    State(state): State<AppState>,
    _auth: CurrentUser,
) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    let teams = state.teams.list_teams().await?;
    Ok(Json(teams.iter().map(TeamResponse::from).collect()))
}

/// Get a team by ID
///
/// GET /api/teams/:id
pub async fn get_team(
    State(state): State<AppState>,
    _auth: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state.teams.get_team(id).await?;
    Ok(Json(TeamResponse::from(&team)))
}

/// PATCH /api/teams/:id
pub async fn update_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(changes): Json<TeamChanges>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state.teams.update_team(user.id(), id, changes).await?;
    Ok(Json(TeamResponse::from(&team)))
}

/// Delete a team and its projects
///
/// DELETE /api/teams/:id
pub async fn delete_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.teams.delete_team(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/teams/:id/members
pub async fn add_members(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMembersRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state.teams.add_members_batch(user.id(), id, req.members).await?;
    Ok(Json(TeamResponse::from(&team)))
}

/// DELETE /api/teams/:id/members
pub async fn remove_members(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RemoveMembersRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state
        .teams
        .remove_members_batch(user.id(), id, req.user_ids)
        .await?;
    Ok(Json(TeamResponse::from(&team)))
}

/// POST /api/teams/:id/members/:user_id/roles
pub async fn assign_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state
        .teams
        .assign_role(user.id(), id, member_id, req.role)
        .await?;
    Ok(Json(TeamResponse::from(&team)))
}

/// DELETE /api/teams/:id/members/:user_id/roles/:role
pub async fn revoke_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, member_id, role)): Path<(Uuid, Uuid, TeamRole)>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state.teams.revoke_role(user.id(), id, member_id, role).await?;
    Ok(Json(TeamResponse::from(&team)))
}

/// PUT /api/teams/:id/members/:user_id/roles
pub async fn set_member_roles(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SetRolesRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state
        .teams
        .set_member_roles(user.id(), id, member_id, req.roles)
        .await?;
    Ok(Json(TeamResponse::from(&team)))
}
