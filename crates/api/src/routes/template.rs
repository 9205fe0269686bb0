use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use okrhub_db::models::{
    AuditChange, ObjectiveTemplate, Permissions, Role, TemplateKeyResult, TemplateKpi,
};
use okrhub_services::dao::{
    audit_log::AuditEntry, key_result::NewKeyResult, kpi::NewKpi, objective::NewObjective,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    ensure_manage_team, hex, iso, load_team,
    objective::{ObjectiveResponse, resolve_owner},
    parse_date, parse_id, user_id, validated,
};
use crate::{error::ApiError, extractors::auth::CurrentUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub id: String,
    pub organization_id: Option<String>,
    pub global: bool,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub key_results: Vec<TemplateKeyResult>,
    pub created_at: String,
}

impl From<ObjectiveTemplate> for TemplateResponse {
    fn from(t: ObjectiveTemplate) -> Self {
        Self {
            id: hex(t.id),
            global: t.organization_id.is_none(),
            organization_id: t.organization_id.map(|id| id.to_hex()),
            name: t.name,
            description: t.description,
            category: t.category,
            key_results: t.key_results,
            created_at: iso(t.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTemplateRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[serde(default)]
    pub key_results: Vec<TemplateKeyResult>,
    #[serde(default)]
    pub global: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApplyTemplateRequest {
    pub team_id: String,
    pub start_date: String,
    pub end_date: String,
    pub owner_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplyTemplateResponse {
    pub objective: ObjectiveResponse,
    pub key_results: usize,
    pub kpis: usize,
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TemplateQuery>,
) -> Result<Json<Vec<TemplateResponse>>, ApiError> {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let templates = state
        .templates
        .list_visible(user.organization_id, category)
        .await?;
    Ok(Json(templates.into_iter().map(TemplateResponse::from).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>), ApiError> {
    if !user.role.has_permission(Permissions::MANAGE_TEMPLATES) {
        return Err(ApiError::forbidden("You do not have permission to manage templates"));
    }
    let body = validated(body)?;

    let organization_id = match (body.global, user.role, user.organization_id) {
        (true, Role::SuperAdmin, _) => None,
        (true, _, _) => {
            return Err(ApiError::forbidden("Only the super admin can create global templates"));
        }
        (false, _, Some(org)) => Some(org),
        (false, _, None) => {
            return Err(ApiError::BadRequest(
                "Templates outside an organization must be global".to_string(),
            ));
        }
    };
    let has_bad_value = body.key_results.iter().any(|kr| {
        !(kr.start_value.is_finite() && kr.target_value.is_finite())
            || kr.kpis.iter().any(|k: &TemplateKpi| !k.target_value.is_finite())
    });
    if has_bad_value {
        return Err(ApiError::Validation("Values must be finite numbers".to_string()));
    }

    let template = state
        .templates
        .create(
            organization_id,
            &body.name,
            body.description,
            &body.category,
            body.key_results,
            user_id(&user)?,
        )
        .await?;

    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "template.created", "template")
                .organization(organization_id)
                .target(template.id)
                .change(AuditChange::set("name", template.name.clone().into())),
        )
        .await;

    Ok((StatusCode::CREATED, Json(template.into())))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(template_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&template_id, "template_id")?;
    let template = state.templates.find_visible(id, user.organization_id).await?;

    let allowed = match template.organization_id {
        None => user.role == Role::SuperAdmin,
        Some(_) => user.role.has_permission(Permissions::MANAGE_TEMPLATES),
    };
    if !allowed {
        return Err(ApiError::forbidden("You cannot delete this template"));
    }

    state.templates.delete(id).await?;
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "template.deleted", "template")
                .organization(template.organization_id)
                .target(Some(id)),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// Instantiates the template in a team: one objective, its key results and their KPIs.
pub async fn apply(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(template_id): Path<String>,
    Json(body): Json<ApplyTemplateRequest>,
) -> Result<(StatusCode, Json<ApplyTemplateResponse>), ApiError> {
    let id = parse_id(&template_id, "template_id")?;
    let team = load_team(&state, &body.team_id).await?;
    ensure_manage_team(&user, &team, Permissions::MANAGE_OBJECTIVES)?;
    let template = state
        .templates
        .find_visible(id, Some(team.organization_id))
        .await?;

    let uid = user_id(&user)?;
    let owner_id = resolve_owner(&team, body.owner_id.as_deref(), uid)?;
    let team_id = team
        .id
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let objective = state
        .objectives
        .create(
            NewObjective {
                organization_id: team.organization_id,
                team_id,
                title: template.name.clone(),
                description: template.description.clone(),
                owner_id,
                start_date: parse_date(&body.start_date, "start_date")?,
                end_date: parse_date(&body.end_date, "end_date")?,
                template_id: Some(id),
            },
            uid,
        )
        .await?;

    let mut kpi_count = 0;
    for kr in &template.key_results {
        let key_result = state
            .key_results
            .create(
                &objective,
                NewKeyResult {
                    title: kr.title.clone(),
                    description: None,
                    owner_id,
                    start_value: kr.start_value,
                    current_value: kr.start_value,
                    target_value: kr.target_value,
                    unit: kr.unit.clone(),
                    start_date: None,
                    end_date: None,
                },
                uid,
            )
            .await?;
        for kpi in &kr.kpis {
            state
                .kpis
                .create(
                    &key_result,
                    NewKpi {
                        name: kpi.name.clone(),
                        description: None,
                        unit: kpi.unit.clone(),
                        frequency: kpi.frequency,
                        current_value: 0.0,
                        target_value: kpi.target_value,
                    },
                    uid,
                )
                .await?;
            kpi_count += 1;
        }
    }

    let objective_id = objective
        .id
        .ok_or_else(|| ApiError::Internal("Objective id missing".to_string()))?;
    let objective = state.objectives.recompute_progress(objective_id).await?;

    state
        .audit_logs
        .record(
            AuditEntry::by_user(Some(uid), "template.applied", "objective")
                .organization(Some(team.organization_id))
                .target(Some(objective_id))
                .change(AuditChange::set("template_id", template_id.into())),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ApplyTemplateResponse {
            objective: objective.into(),
            key_results: template.key_results.len(),
            kpis: kpi_count,
        }),
    ))
}
