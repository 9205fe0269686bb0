use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use okrhub_db::models::{AuditChange, OperationalKeyResult, Permissions, ProgressStatus, Team};
use okrhub_services::dao::{
    audit_log::AuditEntry,
    key_result::{KeyResultUpdate, NewKeyResult},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    ensure_manage_team, ensure_view_team, hex, iso,
    objective::{load_with_team, resolve_owner},
    parse_date, parse_id, user_id, validated,
};
use crate::{error::ApiError, extractors::auth::CurrentUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct KeyResultResponse {
    pub id: String,
    pub objective_id: String,
    pub team_id: String,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub start_value: f64,
    pub current_value: f64,
    pub target_value: f64,
    pub unit: String,
    pub start_date: String,
    pub end_date: String,
    pub progress: f64,
    pub status: ProgressStatus,
    pub updated_at: String,
}

impl From<OperationalKeyResult> for KeyResultResponse {
    fn from(kr: OperationalKeyResult) -> Self {
        Self {
            id: hex(kr.id),
            objective_id: kr.objective_id.to_hex(),
            team_id: kr.team_id.to_hex(),
            title: kr.title,
            description: kr.description,
            owner_id: kr.owner_id.to_hex(),
            start_value: kr.start_value,
            current_value: kr.current_value,
            target_value: kr.target_value,
            unit: kr.unit,
            start_date: iso(kr.start_date),
            end_date: iso(kr.end_date),
            progress: kr.progress,
            status: kr.status,
            updated_at: iso(kr.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateKeyResultRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub owner_id: Option<String>,
    #[serde(default)]
    pub start_value: f64,
    #[serde(default)]
    pub current_value: Option<f64>,
    pub target_value: f64,
    #[validate(length(max = 32))]
    #[serde(default)]
    pub unit: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateKeyResultRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub owner_id: Option<String>,
    pub start_value: Option<f64>,
    pub current_value: Option<f64>,
    pub target_value: Option<f64>,
    #[validate(length(max = 32))]
    pub unit: Option<String>,
}

fn ensure_finite(values: &[Option<f64>]) -> Result<(), ApiError> {
    if values.iter().flatten().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ApiError::Validation("Values must be finite numbers".to_string()))
    }
}

pub(crate) async fn load_with_team_for(
    state: &AppState,
    key_result_id: &str,
) -> Result<(OperationalKeyResult, Team), ApiError> {
    let id = parse_id(key_result_id, "key_result_id")?;
    let key_result = state.key_results.find(id).await?;
    let team = state.teams.find(key_result.team_id).await?;
    Ok((key_result, team))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(objective_id): Path<String>,
    Json(body): Json<CreateKeyResultRequest>,
) -> Result<(StatusCode, Json<KeyResultResponse>), ApiError> {
    let (objective, team) = load_with_team(&state, &objective_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_KEY_RESULTS)?;
    let body = validated(body)?;
    ensure_finite(&[Some(body.start_value), body.current_value, Some(body.target_value)])?;
    let uid = user_id(&user)?;

    let key_result = state
        .key_results
        .create(
            &objective,
            NewKeyResult {
                title: body.title,
                description: body.description,
                owner_id: resolve_owner(&team, body.owner_id.as_deref(), uid)?,
                start_value: body.start_value,
                current_value: body.current_value.unwrap_or(body.start_value),
                target_value: body.target_value,
                unit: body.unit,
                start_date: body.start_date.as_deref().map(|d| parse_date(d, "start_date")).transpose()?,
                end_date: body.end_date.as_deref().map(|d| parse_date(d, "end_date")).transpose()?,
            },
            uid,
        )
        .await?;
    state.objectives.recompute_progress(key_result.objective_id).await?;

    state
        .audit_logs
        .record(
            AuditEntry::by_user(Some(uid), "key_result.created", "key_result")
                .organization(Some(key_result.organization_id))
                .target(key_result.id)
                .change(AuditChange::set("title", key_result.title.clone().into())),
        )
        .await;

    Ok((StatusCode::CREATED, Json(key_result.into())))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(objective_id): Path<String>,
) -> Result<Json<Vec<KeyResultResponse>>, ApiError> {
    let (_, team) = load_with_team(&state, &objective_id).await?;
    ensure_view_team(&user, &team)?;

    let key_results = state
        .key_results
        .list_for_objective(parse_id(&objective_id, "objective_id")?)
        .await?;
    Ok(Json(key_results.into_iter().map(KeyResultResponse::from).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(key_result_id): Path<String>,
) -> Result<Json<KeyResultResponse>, ApiError> {
    let (key_result, team) = load_with_team_for(&state, &key_result_id).await?;
    ensure_view_team(&user, &team)?;
    Ok(Json(key_result.into()))
}

/// Updates values and re-derives the progress of the key result and its objective.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(key_result_id): Path<String>,
    Json(body): Json<UpdateKeyResultRequest>,
) -> Result<Json<KeyResultResponse>, ApiError> {
    let (current, team) = load_with_team_for(&state, &key_result_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_KEY_RESULTS)?;
    let body = validated(body)?;
    ensure_finite(&[body.start_value, body.current_value, body.target_value])?;
    let id = parse_id(&key_result_id, "key_result_id")?;

    let owner_id = match body.owner_id.as_deref() {
        Some(raw) => Some(resolve_owner(&team, Some(raw), current.owner_id)?),
        None => None,
    };
    let updated = state
        .key_results
        .update(
            id,
            KeyResultUpdate {
                title: body.title,
                description: body.description,
                owner_id,
                start_value: body.start_value,
                current_value: body.current_value,
                target_value: body.target_value,
                unit: body.unit,
            },
        )
        .await?;
    state.objectives.recompute_progress(updated.objective_id).await?;

    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "key_result.updated", "key_result")
                .organization(Some(updated.organization_id))
                .target(Some(id))
                .change(AuditChange::diff(
                    "progress",
                    current.progress.into(),
                    updated.progress.into(),
                )),
        )
        .await;

    Ok(Json(updated.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(key_result_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (key_result, team) = load_with_team_for(&state, &key_result_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_KEY_RESULTS)?;
    let id = parse_id(&key_result_id, "key_result_id")?;

    let objective_id = state.key_results.delete(id).await?;
    state.objectives.recompute_progress(objective_id).await?;
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "key_result.deleted", "key_result")
                .organization(Some(key_result.organization_id))
                .target(Some(id)),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}
