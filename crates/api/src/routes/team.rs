use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::DateTime;
use okrhub_db::models::{AuditChange, Permissions, Role, Team, TeamMember, TeamRole};
use okrhub_services::dao::audit_log::AuditEntry;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    ensure_manage_team, ensure_view_team, hex, iso, load_team, parse_id, user_id, validated,
};
use crate::{error::ApiError, extractors::auth::CurrentUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub user_id: String,
    pub role: TeamRole,
    pub email: String,
    pub name: String,
    pub joined_at: String,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: Option<String>,
    pub leader_id: String,
    pub members: Vec<MemberResponse>,
    pub created_at: String,
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        Self {
            id: hex(team.id),
            organization_id: team.organization_id.to_hex(),
            name: team.name,
            description: team.description,
            leader_id: team.leader_id.to_hex(),
            members: team
                .members
                .into_iter()
                .map(|m| MemberResponse {
                    user_id: m.user_id.to_hex(),
                    role: m.role,
                    email: m.email,
                    name: m.name,
                    joined_at: iso(m.joined_at),
                })
                .collect(),
            created_at: iso(team.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: String,
    #[serde(default = "default_member_role")]
    pub role: TeamRole,
}

fn default_member_role() -> TeamRole {
    TeamRole::Member
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(organization_id): Path<String>,
    Json(body): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    let org_id = parse_id(&organization_id, "organization_id")?;
    let body = validated(body)?;

    let allowed = match user.role {
        Role::SuperAdmin => true,
        Role::OrgAdmin | Role::TeamLeader => user.belongs_to(org_id),
        _ => false,
    };
    if !allowed {
        return Err(ApiError::forbidden("You cannot create teams in this organization"));
    }
    state.organizations.base.find_by_id(org_id).await?;

    let team = state
        .teams
        .create(org_id, &body.name, body.description, &user)
        .await?;
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "team.created", "team")
                .organization(Some(org_id))
                .target(team.id)
                .change(AuditChange::set("name", team.name.clone().into())),
        )
        .await;

    Ok((StatusCode::CREATED, Json(team.into())))
}

/// Org admins and the super admin see every team; everyone else sees their own.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(organization_id): Path<String>,
) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    let org_id = parse_id(&organization_id, "organization_id")?;
    let teams = match user.role {
        Role::SuperAdmin => state.teams.list_for_organization(org_id).await?,
        _ if !user.belongs_to(org_id) => {
            return Err(ApiError::forbidden("You do not have access to this organization"));
        }
        role if role.has_permission(Permissions::VIEW_ALL_TEAMS) => {
            state.teams.list_for_organization(org_id).await?
        }
        _ => state.teams.list_for_member(org_id, user_id(&user)?).await?,
    };
    Ok(Json(teams.into_iter().map(TeamResponse::from).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<String>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = load_team(&state, &team_id).await?;
    ensure_view_team(&user, &team)?;
    Ok(Json(team.into()))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<String>,
    Json(body): Json<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = load_team(&state, &team_id).await?;
    // Leaders may rename their own team.
    ensure_manage_team(&user, &team, Permissions::VIEW_TEAM)?;
    let body = validated(body)?;
    let id = parse_id(&team_id, "team_id")?;

    let mut entry = AuditEntry::by_user(user.id, "team.updated", "team")
        .organization(Some(team.organization_id))
        .target(Some(id));
    if let Some(name) = &body.name {
        entry = entry.change(AuditChange::diff("name", team.name.clone().into(), name.clone().into()));
    }

    let updated = state.teams.update(id, body.name, body.description).await?;
    state.audit_logs.record(entry).await;
    Ok(Json(updated.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let team = load_team(&state, &team_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_TEAMS)?;

    let id = parse_id(&team_id, "team_id")?;
    state.teams.delete(id).await?;
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "team.deleted", "team")
                .organization(Some(team.organization_id))
                .target(Some(id)),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// Adds an existing user of the team's organization.
pub async fn add_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<String>,
    Json(body): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    let team = load_team(&state, &team_id).await?;
    ensure_manage_team(&user, &team, Permissions::INVITE_MEMBERS)?;

    let member_id = parse_id(&body.user_id, "user_id")?;
    let member = state.users.base.find_by_id(member_id).await?;
    if !member.belongs_to(team.organization_id) {
        return Err(ApiError::BadRequest(
            "User does not belong to this organization".to_string(),
        ));
    }

    let id = parse_id(&team_id, "team_id")?;
    let added = state
        .teams
        .add_member(
            id,
            TeamMember {
                user_id: member_id,
                role: body.role,
                email: member.email.clone(),
                name: member.name.clone(),
                joined_at: DateTime::now(),
            },
        )
        .await?;
    if !added {
        return Err(ApiError::Conflict("User is already a member of this team".to_string()));
    }

    if !member.role.is_at_least(body.role.global_role()) {
        state.users.set_role(member_id, body.role.global_role()).await?;
    }
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "team.member_added", "team")
                .organization(Some(team.organization_id))
                .target(Some(id))
                .change(AuditChange::set("user_id", member_id.to_hex().into())),
        )
        .await;

    let team = state.teams.find(id).await?;
    Ok((StatusCode::CREATED, Json(team.into())))
}

pub async fn remove_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((team_id, member_id)): Path<(String, String)>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = load_team(&state, &team_id).await?;
    ensure_manage_team(&user, &team, Permissions::INVITE_MEMBERS)?;

    let id = parse_id(&team_id, "team_id")?;
    let member_id = parse_id(&member_id, "user_id")?;
    let updated = state.teams.remove_member(id, member_id).await?;
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "team.member_removed", "team")
                .organization(Some(team.organization_id))
                .target(Some(id))
                .change(AuditChange {
                    field: "user_id".to_string(),
                    old_value: Some(member_id.to_hex().into()),
                    new_value: None,
                }),
        )
        .await;
    Ok(Json(updated.into()))
}
