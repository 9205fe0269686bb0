use axum::{Json, extract::State};
use okrhub_services::{
    dao::{base::DaoError, user::IdentityProfile},
    routing::resolve_landing_route,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::user::UserResponse;
use crate::{
    error::ApiError,
    extractors::auth::{AuthUser, CurrentUser},
    state::AppState,
};

/// Display fields the client may send when the token does not carry them.
/// The email is never taken from the body.
#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LandingResponse {
    pub route: String,
}

/// First sign-in: upserts the local account for the token subject.
pub async fn sync(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SyncRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    // Without an email claim, fall back to the address the signed identity
    // webhook stored for this subject.
    let email = match auth.claims.email.clone() {
        Some(email) => Some(email),
        None => match state.users.find_by_external_id(&auth.external_id).await {
            Ok(user) => Some(user.email),
            Err(DaoError::NotFound) => None,
            Err(e) => return Err(e.into()),
        },
    }
    .map(|e| e.trim().to_lowercase())
    .filter(|e| e.contains('@'))
    .ok_or_else(|| {
        ApiError::Validation("The identity token does not carry a verified email".to_string())
    })?;
    let name = auth
        .claims
        .name
        .clone()
        .or(body.name)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let profile = IdentityProfile {
        external_id: auth.external_id,
        email,
        name,
        image_url: auth.claims.image_url.clone().or(body.image_url),
    };

    let user = state
        .users
        .sync_identity(profile, state.settings.app.super_admin_email.as_deref())
        .await?;
    info!(user_id = ?user.id, role = %user.role, "Identity synced");

    Ok(Json(user.into()))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(user.into()))
}

pub async fn landing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<LandingResponse>, ApiError> {
    let organization_name = match user.organization_id {
        Some(org_id) => state
            .organizations
            .base
            .find_one(bson::doc! { "_id": org_id })
            .await?
            .map(|org| org.name),
        None => None,
    };

    Ok(Json(LandingResponse {
        route: resolve_landing_route(user.role, organization_name.as_deref()),
    }))
}
