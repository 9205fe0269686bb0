use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::DateTime;
use okrhub_db::models::{AuditChange, Invitation, InvitationStatus, Permissions, TeamRole};
use okrhub_services::{background::spawn_invitation_email, dao::audit_log::AuditEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

use super::{
    ensure_manage_team, hex, iso, load_team, team::TeamResponse, user_id, validated,
};
use crate::{error::ApiError, extractors::auth::CurrentUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub id: String,
    pub team_id: String,
    pub organization_id: String,
    pub email: String,
    pub name: String,
    pub role: TeamRole,
    pub token: String,
    /// Effective status: a past-due pending invitation reads as `expired`.
    pub status: InvitationStatus,
    pub expires_at: String,
    pub accepted_at: Option<String>,
    pub created_at: String,
}

impl InvitationResponse {
    fn new(invitation: Invitation, now: DateTime) -> Self {
        Self {
            status: invitation.effective_status(now),
            id: hex(invitation.id),
            team_id: invitation.team_id.to_hex(),
            organization_id: invitation.organization_id.to_hex(),
            email: invitation.email,
            name: invitation.name,
            role: invitation.role,
            token: invitation.token,
            expires_at: iso(invitation.expires_at),
            accepted_at: invitation.accepted_at.map(iso),
            created_at: iso(invitation.created_at),
        }
    }
}

/// Public view for the invitation landing page; omits the token and ids.
#[derive(Debug, Serialize)]
pub struct InvitationDetails {
    pub email: String,
    pub name: String,
    pub role: TeamRole,
    pub status: InvitationStatus,
    pub expires_at: String,
    pub team_name: String,
    pub organization_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: TeamRole,
}

fn default_role() -> TeamRole {
    TeamRole::Member
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<String>,
    Json(body): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>), ApiError> {
    let team = load_team(&state, &team_id).await?;
    ensure_manage_team(&user, &team, Permissions::INVITE_MEMBERS)?;
    let body = validated(body)?;

    let invitation = state
        .invitations
        .create(
            &team,
            &body.email,
            &body.name,
            body.role,
            user_id(&user)?,
            state.settings.invitations.ttl_days,
        )
        .await?;

    spawn_invitation_email(
        state.email.clone(),
        invitation.email.clone(),
        invitation.name.clone(),
        team.name.clone(),
        user.name.clone(),
        invitation.token.clone(),
    );
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "invitation.created", "invitation")
                .organization(Some(team.organization_id))
                .target(invitation.id)
                .change(AuditChange::set("email", invitation.email.clone().into())),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse::new(invitation, DateTime::now())),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<InvitationResponse>>, ApiError> {
    let team = load_team(&state, &team_id).await?;
    ensure_manage_team(&user, &team, Permissions::INVITE_MEMBERS)?;

    let now = DateTime::now();
    let invitations = state
        .invitations
        .list_for_team(team.id.ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?)
        .await?;
    Ok(Json(
        invitations
            .into_iter()
            .map(|i| InvitationResponse::new(i, now))
            .collect(),
    ))
}

/// Unauthenticated lookup used by the invitation landing page.
pub async fn get_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<InvitationDetails>, ApiError> {
    let invitation = state.invitations.find_by_token(&token).await?;
    let team_name = state
        .teams
        .base
        .find_one(bson::doc! { "_id": invitation.team_id })
        .await?
        .map(|t| t.name)
        .unwrap_or_default();
    let organization_name = state
        .organizations
        .base
        .find_one(bson::doc! { "_id": invitation.organization_id })
        .await?
        .map(|o| o.name)
        .unwrap_or_default();

    Ok(Json(InvitationDetails {
        status: invitation.effective_status(DateTime::now()),
        email: invitation.email,
        name: invitation.name,
        role: invitation.role,
        expires_at: iso(invitation.expires_at),
        team_name,
        organization_name,
    }))
}

pub async fn accept(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(token): Path<String>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state.invitations.accept(&token, &user).await?;
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "invitation.accepted", "team")
                .organization(Some(team.organization_id))
                .target(team.id),
        )
        .await;
    Ok(Json(team.into()))
}

/// Persists `expired` on every overdue pending invitation.
pub async fn expire(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    if !user.role.has_permission(Permissions::MANAGE_USERS) {
        return Err(ApiError::forbidden("You cannot manage invitations"));
    }
    let expired = state.invitations.expire_overdue().await?;
    if expired > 0 {
        state
            .audit_logs
            .record(
                AuditEntry::by_user(user.id, "invitation.expired", "invitation")
                    .organization(user.organization_id)
                    .change(AuditChange::set("count", expired.into())),
            )
            .await;
    }
    Ok(Json(json!({ "expired": expired })))
}
