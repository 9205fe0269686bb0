use axum::{
    Json,
    extract::{Path, State},
};
use okrhub_db::models::{Permissions, ProgressStatus, Team, User};
use okrhub_services::analytics::{self, OrganizationAnalytics, TeamAnalytics};
use serde::Serialize;

use super::{ensure_organization_permission, ensure_view_team, hex, iso, load_team, parse_id};
use crate::{error::ApiError, extractors::auth::CurrentUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct TimelineEntry {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    pub start_date: String,
    pub end_date: String,
    pub progress: f64,
    pub status: ProgressStatus,
    pub milestones_completed: usize,
    pub milestones_total: usize,
}

fn ensure_analytics(user: &User, team: &Team) -> Result<(), ApiError> {
    ensure_view_team(user, team)?;
    if user.role.has_permission(Permissions::VIEW_ANALYTICS) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not have permission to view analytics"))
    }
}

async fn team_summary(state: &AppState, team: &Team) -> Result<TeamAnalytics, ApiError> {
    let team_id = team
        .id
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;
    let objectives = state.objectives.list_for_team(team_id).await?;
    let key_results = state.key_results.list_for_team(team_id).await?;
    let kpis = state.kpis.list_for_team(team_id).await?;
    Ok(analytics::summarize_team(
        team_id,
        &team.name,
        &objectives,
        &key_results,
        &kpis,
    ))
}

pub async fn team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<String>,
) -> Result<Json<TeamAnalytics>, ApiError> {
    let team = load_team(&state, &team_id).await?;
    ensure_analytics(&user, &team)?;
    Ok(Json(team_summary(&state, &team).await?))
}

pub async fn organization(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(organization_id): Path<String>,
) -> Result<Json<OrganizationAnalytics>, ApiError> {
    let org_id = parse_id(&organization_id, "organization_id")?;
    ensure_organization_permission(&user, org_id, Permissions::VIEW_ANALYTICS)?;
    ensure_organization_permission(&user, org_id, Permissions::VIEW_ALL_TEAMS)?;

    let teams = state.teams.list_for_organization(org_id).await?;
    let mut summaries = Vec::with_capacity(teams.len());
    for team in &teams {
        summaries.push(team_summary(&state, team).await?);
    }
    let objectives = state.objectives.list_for_organization(org_id).await?;
    Ok(Json(analytics::summarize_organization(
        org_id, summaries, &objectives,
    )))
}

pub async fn timeline(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<TimelineEntry>>, ApiError> {
    let team = load_team(&state, &team_id).await?;
    ensure_view_team(&user, &team)?;

    let objectives = state
        .objectives
        .list_for_team(parse_id(&team_id, "team_id")?)
        .await?;
    let entries = objectives
        .into_iter()
        .map(|o| TimelineEntry {
            id: hex(o.id),
            milestones_completed: o.milestones.iter().filter(|m| m.completed).count(),
            milestones_total: o.milestones.len(),
            title: o.title,
            owner_id: o.owner_id.to_hex(),
            start_date: iso(o.start_date),
            end_date: iso(o.end_date),
            progress: o.progress,
            status: o.status,
        })
        .collect();
    Ok(Json(entries))
}
