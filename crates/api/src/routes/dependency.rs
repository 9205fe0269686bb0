use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::oid::ObjectId;
use okrhub_db::models::{
    AuditChange, DependencyType, ObjectiveDependency, Permissions, ProgressStatus,
    StrategicObjective,
};
use okrhub_services::dao::audit_log::AuditEntry;
use serde::{Deserialize, Serialize};

use super::{ensure_organization_permission, hex, iso, parse_id, user_id};
use crate::{error::ApiError, extractors::auth::CurrentUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct DependencyResponse {
    pub id: String,
    pub source: String,
    pub target: String,
    pub dependency_type: DependencyType,
    pub created_at: String,
}

impl From<ObjectiveDependency> for DependencyResponse {
    fn from(d: ObjectiveDependency) -> Self {
        Self {
            id: hex(d.id),
            source: d.source.to_hex(),
            target: d.target.to_hex(),
            dependency_type: d.dependency_type,
            created_at: iso(d.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub team_id: String,
    pub title: String,
    pub progress: f64,
    pub status: ProgressStatus,
}

impl From<StrategicObjective> for GraphNode {
    fn from(o: StrategicObjective) -> Self {
        Self {
            id: hex(o.id),
            team_id: o.team_id.to_hex(),
            title: o.title,
            progress: o.progress,
            status: o.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<DependencyResponse>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDependencyRequest {
    pub source: String,
    pub target: String,
    pub dependency_type: DependencyType,
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(organization_id): Path<String>,
    Json(body): Json<CreateDependencyRequest>,
) -> Result<(StatusCode, Json<DependencyResponse>), ApiError> {
    let org_id = parse_id(&organization_id, "organization_id")?;
    ensure_organization_permission(&user, org_id, Permissions::MANAGE_OBJECTIVES)?;
    let source = parse_id(&body.source, "source")?;
    let target = parse_id(&body.target, "target")?;

    let dependency = state
        .dependencies
        .create(org_id, source, target, body.dependency_type, user_id(&user)?)
        .await?;

    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "dependency.created", "dependency")
                .organization(Some(org_id))
                .target(dependency.id)
                .change(AuditChange::set("source", source.to_hex().into()))
                .change(AuditChange::set("target", target.to_hex().into())),
        )
        .await;

    Ok((StatusCode::CREATED, Json(dependency.into())))
}

pub async fn graph(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(organization_id): Path<String>,
) -> Result<Json<DependencyGraph>, ApiError> {
    let org_id = parse_id(&organization_id, "organization_id")?;
    ensure_organization_permission(&user, org_id, Permissions::VIEW_ORGANIZATION)?;

    let nodes = state.objectives.list_for_organization(org_id).await?;
    let live: HashSet<ObjectId> = nodes.iter().filter_map(|o| o.id).collect();
    let edges = state.dependencies.list_for_organization(org_id).await?;
    Ok(Json(DependencyGraph {
        nodes: nodes.into_iter().map(GraphNode::from).collect(),
        edges: edges
            .into_iter()
            .filter(|e| live.contains(&e.source) && live.contains(&e.target))
            .map(DependencyResponse::from)
            .collect(),
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(dependency_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&dependency_id, "dependency_id")?;
    let dependency = state.dependencies.base.find_by_id(id).await?;
    ensure_organization_permission(&user, dependency.organization_id, Permissions::MANAGE_OBJECTIVES)?;

    state
        .dependencies
        .delete(dependency.organization_id, id)
        .await?;
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "dependency.deleted", "dependency")
                .organization(Some(dependency.organization_id))
                .target(Some(id)),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}
