use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use okrhub_db::models::{
    AuditChange, Kpi, KpiFrequency, KpiReading, Permissions, ProgressStatus, Team,
};
use okrhub_services::{
    access,
    dao::{
        audit_log::AuditEntry,
        kpi::{KpiUpdate, NewKpi},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    ensure_manage_team, ensure_view_team, hex, iso, key_result::load_with_team_for, parse_id,
    user_id, validated,
};
use crate::{error::ApiError, extractors::auth::CurrentUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct ReadingResponse {
    pub value: f64,
    pub recorded_at: String,
    pub recorded_by: String,
}

impl From<KpiReading> for ReadingResponse {
    fn from(r: KpiReading) -> Self {
        Self {
            value: r.value,
            recorded_at: iso(r.recorded_at),
            recorded_by: r.recorded_by.to_hex(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct KpiResponse {
    pub id: String,
    pub key_result_id: String,
    pub objective_id: String,
    pub team_id: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub frequency: KpiFrequency,
    pub current_value: f64,
    pub target_value: f64,
    pub progress: f64,
    pub status: ProgressStatus,
    pub history: Vec<ReadingResponse>,
    pub updated_at: String,
}

impl From<Kpi> for KpiResponse {
    fn from(kpi: Kpi) -> Self {
        Self {
            id: hex(kpi.id),
            key_result_id: kpi.key_result_id.to_hex(),
            objective_id: kpi.objective_id.to_hex(),
            team_id: kpi.team_id.to_hex(),
            name: kpi.name,
            description: kpi.description,
            unit: kpi.unit,
            frequency: kpi.frequency,
            current_value: kpi.current_value,
            target_value: kpi.target_value,
            progress: kpi.progress,
            status: kpi.status,
            history: kpi.history.into_iter().map(ReadingResponse::from).collect(),
            updated_at: iso(kpi.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateKpiRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 32))]
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub frequency: KpiFrequency,
    #[serde(default)]
    pub current_value: f64,
    pub target_value: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateKpiRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 32))]
    pub unit: Option<String>,
    pub frequency: Option<KpiFrequency>,
    pub target_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateValueRequest {
    pub current_value: f64,
}

async fn load_kpi(state: &AppState, kpi_id: &str) -> Result<(Kpi, Team), ApiError> {
    let id = parse_id(kpi_id, "kpi_id")?;
    let kpi = state.kpis.find(id).await?;
    let team = state.teams.find(kpi.team_id).await?;
    Ok((kpi, team))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(key_result_id): Path<String>,
    Json(body): Json<CreateKpiRequest>,
) -> Result<(StatusCode, Json<KpiResponse>), ApiError> {
    let (key_result, team) = load_with_team_for(&state, &key_result_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_KPIS)?;
    let body = validated(body)?;
    if !(body.current_value.is_finite() && body.target_value.is_finite()) {
        return Err(ApiError::Validation("Values must be finite numbers".to_string()));
    }
    let uid = user_id(&user)?;

    let kpi = state
        .kpis
        .create(
            &key_result,
            NewKpi {
                name: body.name,
                description: body.description,
                unit: body.unit,
                frequency: body.frequency,
                current_value: body.current_value,
                target_value: body.target_value,
            },
            uid,
        )
        .await?;

    state
        .audit_logs
        .record(
            AuditEntry::by_user(Some(uid), "kpi.created", "kpi")
                .organization(Some(kpi.organization_id))
                .target(kpi.id)
                .change(AuditChange::set("name", kpi.name.clone().into())),
        )
        .await;

    Ok((StatusCode::CREATED, Json(kpi.into())))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(key_result_id): Path<String>,
) -> Result<Json<Vec<KpiResponse>>, ApiError> {
    let (_, team) = load_with_team_for(&state, &key_result_id).await?;
    ensure_view_team(&user, &team)?;

    let kpis = state
        .kpis
        .list_for_key_result(parse_id(&key_result_id, "key_result_id")?)
        .await?;
    Ok(Json(kpis.into_iter().map(KpiResponse::from).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(kpi_id): Path<String>,
) -> Result<Json<KpiResponse>, ApiError> {
    let (kpi, team) = load_kpi(&state, &kpi_id).await?;
    ensure_view_team(&user, &team)?;
    Ok(Json(kpi.into()))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(kpi_id): Path<String>,
    Json(body): Json<UpdateKpiRequest>,
) -> Result<Json<KpiResponse>, ApiError> {
    let (current, team) = load_kpi(&state, &kpi_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_KPIS)?;
    let body = validated(body)?;
    if body.target_value.is_some_and(|v| !v.is_finite()) {
        return Err(ApiError::Validation("Values must be finite numbers".to_string()));
    }
    let id = parse_id(&kpi_id, "kpi_id")?;

    let updated = state
        .kpis
        .update(
            id,
            KpiUpdate {
                name: body.name,
                description: body.description,
                unit: body.unit,
                frequency: body.frequency,
                target_value: body.target_value,
            },
        )
        .await?;

    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "kpi.updated", "kpi")
                .organization(Some(updated.organization_id))
                .target(Some(id))
                .change(AuditChange::diff(
                    "target_value",
                    current.target_value.into(),
                    updated.target_value.into(),
                )),
        )
        .await;

    Ok(Json(updated.into()))
}

/// Records a reading. Team members with value rights may call this even
/// though they cannot edit the KPI definition.
pub async fn update_value(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(kpi_id): Path<String>,
    Json(body): Json<UpdateValueRequest>,
) -> Result<Json<KpiResponse>, ApiError> {
    let (current, team) = load_kpi(&state, &kpi_id).await?;
    if !access::can_update_kpi_values(&user, &team) {
        return Err(ApiError::forbidden("You cannot update values for this KPI"));
    }
    let id = parse_id(&kpi_id, "kpi_id")?;

    let updated = state
        .kpis
        .update_value(id, body.current_value, user_id(&user)?)
        .await?;

    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "kpi.value_updated", "kpi")
                .organization(Some(updated.organization_id))
                .target(Some(id))
                .change(AuditChange::diff(
                    "current_value",
                    current.current_value.into(),
                    updated.current_value.into(),
                )),
        )
        .await;

    Ok(Json(updated.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(kpi_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (kpi, team) = load_kpi(&state, &kpi_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_KPIS)?;
    let id = parse_id(&kpi_id, "kpi_id")?;

    state.kpis.delete(id).await?;
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "kpi.deleted", "kpi")
                .organization(Some(kpi.organization_id))
                .target(Some(id)),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}
