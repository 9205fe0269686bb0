use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::oid::ObjectId;
use okrhub_db::models::{AuditChange, Milestone, Permissions, ProgressStatus, StrategicObjective, Team};
use okrhub_services::dao::{
    audit_log::AuditEntry,
    objective::{NewObjective, ObjectiveUpdate},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    ensure_manage_team, ensure_view_team, hex, iso, load_team, parse_date, parse_id, user_id,
    validated,
};
use crate::{error::ApiError, extractors::auth::CurrentUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct MilestoneResponse {
    pub id: String,
    pub title: String,
    pub weight: f64,
    pub completed: bool,
    pub due_date: Option<String>,
    pub completed_at: Option<String>,
}

impl From<Milestone> for MilestoneResponse {
    fn from(m: Milestone) -> Self {
        Self {
            id: m.id,
            title: m.title,
            weight: m.weight,
            completed: m.completed,
            due_date: m.due_date.map(iso),
            completed_at: m.completed_at.map(iso),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ObjectiveResponse {
    pub id: String,
    pub organization_id: String,
    pub team_id: String,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub start_date: String,
    pub end_date: String,
    pub milestones: Vec<MilestoneResponse>,
    pub progress: f64,
    pub status: ProgressStatus,
    pub template_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<StrategicObjective> for ObjectiveResponse {
    fn from(o: StrategicObjective) -> Self {
        Self {
            id: hex(o.id),
            organization_id: o.organization_id.to_hex(),
            team_id: o.team_id.to_hex(),
            title: o.title,
            description: o.description,
            owner_id: o.owner_id.to_hex(),
            start_date: iso(o.start_date),
            end_date: iso(o.end_date),
            milestones: o.milestones.into_iter().map(MilestoneResponse::from).collect(),
            progress: o.progress,
            status: o.status,
            template_id: o.template_id.map(|id| id.to_hex()),
            created_at: iso(o.created_at),
            updated_at: iso(o.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateObjectiveRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub owner_id: Option<String>,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateObjectiveRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub owner_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMilestoneRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub due_date: Option<String>,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct UpdateMilestoneRequest {
    pub completed: bool,
}

/// Owners must be members of the team; defaults to the caller.
pub(crate) fn resolve_owner(
    team: &Team,
    owner_id: Option<&str>,
    fallback: ObjectId,
) -> Result<ObjectId, ApiError> {
    let Some(raw) = owner_id else {
        return Ok(fallback);
    };
    let owner = parse_id(raw, "owner_id")?;
    if !team.is_member(owner) {
        return Err(ApiError::Validation("The owner must be a member of the team".to_string()));
    }
    Ok(owner)
}

pub(crate) async fn load_with_team(
    state: &AppState,
    objective_id: &str,
) -> Result<(StrategicObjective, Team), ApiError> {
    let id = parse_id(objective_id, "objective_id")?;
    let objective = state.objectives.find(id).await?;
    let team = state.teams.find(objective.team_id).await?;
    Ok((objective, team))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<String>,
    Json(body): Json<CreateObjectiveRequest>,
) -> Result<(StatusCode, Json<ObjectiveResponse>), ApiError> {
    let team = load_team(&state, &team_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_OBJECTIVES)?;
    let body = validated(body)?;
    let uid = user_id(&user)?;

    let objective = state
        .objectives
        .create(
            NewObjective {
                organization_id: team.organization_id,
                team_id: team.id.ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?,
                title: body.title,
                description: body.description,
                owner_id: resolve_owner(&team, body.owner_id.as_deref(), uid)?,
                start_date: parse_date(&body.start_date, "start_date")?,
                end_date: parse_date(&body.end_date, "end_date")?,
                template_id: None,
            },
            uid,
        )
        .await?;

    state
        .audit_logs
        .record(
            AuditEntry::by_user(Some(uid), "objective.created", "objective")
                .organization(Some(team.organization_id))
                .target(objective.id)
                .change(AuditChange::set("title", objective.title.clone().into())),
        )
        .await;

    Ok((StatusCode::CREATED, Json(objective.into())))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<ObjectiveResponse>>, ApiError> {
    let team = load_team(&state, &team_id).await?;
    ensure_view_team(&user, &team)?;

    let objectives = state
        .objectives
        .list_for_team(parse_id(&team_id, "team_id")?)
        .await?;
    Ok(Json(objectives.into_iter().map(ObjectiveResponse::from).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(objective_id): Path<String>,
) -> Result<Json<ObjectiveResponse>, ApiError> {
    let (objective, team) = load_with_team(&state, &objective_id).await?;
    ensure_view_team(&user, &team)?;
    Ok(Json(objective.into()))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(objective_id): Path<String>,
    Json(body): Json<UpdateObjectiveRequest>,
) -> Result<Json<ObjectiveResponse>, ApiError> {
    let (objective, team) = load_with_team(&state, &objective_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_OBJECTIVES)?;
    let body = validated(body)?;
    let id = parse_id(&objective_id, "objective_id")?;

    let owner_id = match body.owner_id.as_deref() {
        Some(raw) => Some(resolve_owner(&team, Some(raw), objective.owner_id)?),
        None => None,
    };
    let update = ObjectiveUpdate {
        title: body.title,
        description: body.description,
        owner_id,
        start_date: body.start_date.as_deref().map(|d| parse_date(d, "start_date")).transpose()?,
        end_date: body.end_date.as_deref().map(|d| parse_date(d, "end_date")).transpose()?,
    };

    let mut entry = AuditEntry::by_user(user.id, "objective.updated", "objective")
        .organization(Some(objective.organization_id))
        .target(Some(id));
    if let Some(title) = &update.title {
        entry = entry.change(AuditChange::diff("title", objective.title.into(), title.clone().into()));
    }

    let updated = state.objectives.update(id, update).await?;
    state.audit_logs.record(entry).await;
    Ok(Json(updated.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(objective_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (objective, team) = load_with_team(&state, &objective_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_OBJECTIVES)?;

    let id = parse_id(&objective_id, "objective_id")?;
    state.objectives.delete(id).await?;
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "objective.deleted", "objective")
                .organization(Some(objective.organization_id))
                .target(Some(id)),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_milestone(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(objective_id): Path<String>,
    Json(body): Json<CreateMilestoneRequest>,
) -> Result<(StatusCode, Json<ObjectiveResponse>), ApiError> {
    let (objective, team) = load_with_team(&state, &objective_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_OBJECTIVES)?;
    let body = validated(body)?;
    let id = parse_id(&objective_id, "objective_id")?;

    let due_date = body.due_date.as_deref().map(|d| parse_date(d, "due_date")).transpose()?;
    let updated = state
        .objectives
        .add_milestone(id, &body.title, body.weight, due_date)
        .await?;
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "objective.milestone_added", "objective")
                .organization(Some(objective.organization_id))
                .target(Some(id))
                .change(AuditChange::set("milestone", body.title.into())),
        )
        .await;

    Ok((StatusCode::CREATED, Json(updated.into())))
}

pub async fn update_milestone(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((objective_id, milestone_id)): Path<(String, String)>,
    Json(body): Json<UpdateMilestoneRequest>,
) -> Result<Json<ObjectiveResponse>, ApiError> {
    let (objective, team) = load_with_team(&state, &objective_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_OBJECTIVES)?;
    let id = parse_id(&objective_id, "objective_id")?;

    let updated = state
        .objectives
        .set_milestone_completed(id, &milestone_id, body.completed)
        .await?;
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "objective.milestone_updated", "objective")
                .organization(Some(objective.organization_id))
                .target(Some(id))
                .change(AuditChange::diff(
                    "progress",
                    objective.progress.into(),
                    updated.progress.into(),
                )),
        )
        .await;
    Ok(Json(updated.into()))
}
