use axum::{
    Json,
    extract::{Path, Query, State},
};
use okrhub_db::models::{ActorType, AuditChange, AuditLog, Permissions, Role};
use okrhub_services::dao::base::{PaginatedResult, PaginationParams};
use serde::{Deserialize, Serialize};

use super::{ensure_organization_permission, hex, iso, parse_id};
use crate::{error::ApiError, extractors::auth::CurrentUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub action: Option<String>,
}

impl AuditLogQuery {
    fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub id: String,
    pub organization_id: Option<String>,
    pub actor_id: Option<String>,
    pub actor_type: ActorType,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<String>,
    pub changes: Vec<AuditChange>,
    pub created_at: String,
}

impl From<AuditLog> for AuditLogResponse {
    fn from(log: AuditLog) -> Self {
        Self {
            id: hex(log.id),
            organization_id: log.organization_id.map(|id| id.to_hex()),
            actor_id: log.actor_id.map(|id| id.to_hex()),
            actor_type: log.actor_type,
            action: log.action,
            target_type: log.target_type,
            target_id: log.target_id.map(|id| id.to_hex()),
            changes: log.changes,
            created_at: iso(log.created_at),
        }
    }
}

/// Newest first, optionally filtered by exact action name.
pub async fn list_for_organization(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(organization_id): Path<String>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<PaginatedResult<AuditLogResponse>>, ApiError> {
    let org_id = parse_id(&organization_id, "organization_id")?;
    ensure_organization_permission(&user, org_id, Permissions::VIEW_AUDIT_LOGS)?;

    let action = query.action.as_deref().filter(|a| !a.is_empty());
    let page = state
        .audit_logs
        .list_for_organization(org_id, action, &query.pagination())
        .await?;
    Ok(Json(page.map(AuditLogResponse::from)))
}

pub async fn list_all(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<PaginatedResult<AuditLogResponse>>, ApiError> {
    if user.role != Role::SuperAdmin {
        return Err(ApiError::forbidden("Only the super admin can view all audit logs"));
    }
    let action = query.action.as_deref().filter(|a| !a.is_empty());
    let page = state
        .audit_logs
        .list_all(action, &query.pagination())
        .await?;
    Ok(Json(page.map(AuditLogResponse::from)))
}
