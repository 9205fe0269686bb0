use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use okrhub_db::models::{AuditChange, Permissions, Role, User};
use okrhub_services::dao::audit_log::AuditEntry;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ensure_organization_permission, hex, iso, parse_id, validated};
use crate::{error::ApiError, extractors::auth::CurrentUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
    pub role: Role,
    /// Hex organization id, `SYSTEM` for the super admin, or null.
    pub organization_id: Option<String>,
    pub permissions: Vec<String>,
    pub pending_identity: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: hex(user.id),
            organization_id: user.organization_scope(),
            permissions: user.role.permissions().names(),
            pending_identity: user.is_placeholder(),
            created_at: iso(user.created_at),
            external_id: user.external_id,
            email: user.email,
            name: user.name,
            image_url: user.image_url,
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(organization_id): Path<String>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let org_id = parse_id(&organization_id, "organization_id")?;
    ensure_organization_permission(&user, org_id, Permissions::MANAGE_USERS)?;

    let users = state.users.list_by_organization(org_id).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Creates a placeholder account that is claimed on the owner's first sign-in.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(organization_id): Path<String>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let org_id = parse_id(&organization_id, "organization_id")?;
    ensure_organization_permission(&user, org_id, Permissions::MANAGE_USERS)?;
    let body = validated(body)?;

    if !Role::OrgAdmin.is_at_least(body.role) {
        return Err(ApiError::forbidden("Users can be created with org_admin or a lower role"));
    }
    if !user.role.is_at_least(body.role) {
        return Err(ApiError::forbidden("You cannot grant a role above your own"));
    }

    let created = state
        .users
        .create_placeholder(&body.email, body.name.trim(), body.role, org_id)
        .await?;

    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "user.created", "user")
                .organization(Some(org_id))
                .target(created.id)
                .change(AuditChange::set("email", created.email.clone().into()))
                .change(AuditChange::set("role", created.role.as_str().into())),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Global role change; super admin only, and never to or from super_admin.
pub async fn set_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<String>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if body.role == Role::SuperAdmin {
        return Err(ApiError::forbidden("There can only be one super admin"));
    }
    if !user.role.can_assign(body.role) {
        return Err(ApiError::forbidden("Only the super admin can change roles"));
    }

    let target_id = parse_id(&user_id, "user_id")?;
    let target = state.users.base.find_by_id(target_id).await?;
    if target.role == Role::SuperAdmin {
        return Err(ApiError::forbidden("The super admin role cannot be changed"));
    }

    let updated = state.users.set_role(target_id, body.role).await?;
    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "user.role_changed", "user")
                .organization(target.organization_id)
                .target(Some(target_id))
                .change(AuditChange::diff(
                    "role",
                    target.role.as_str().into(),
                    body.role.as_str().into(),
                )),
        )
        .await;

    Ok(Json(updated.into()))
}
