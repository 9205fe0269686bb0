pub mod analytics;
pub mod audit_log;
pub mod auth;
pub mod dependency;
pub mod email;
pub mod invitation;
pub mod key_result;
pub mod kpi;
pub mod objective;
pub mod organization;
pub mod team;
pub mod template;
pub mod user;
pub mod webhook;

use bson::oid::ObjectId;
use chrono::{NaiveDate, Utc};
use okrhub_db::models::{Permissions, Team, User};
use okrhub_services::access;
use validator::Validate;

use crate::{error::ApiError, state::AppState};

pub(crate) fn parse_id(value: &str, name: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value).map_err(|_| ApiError::BadRequest(format!("Invalid {name}")))
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub(crate) fn parse_date(value: &str, name: &str) -> Result<bson::DateTime, ApiError> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Ok(bson::DateTime::from_chrono(dt.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| bson::DateTime::from_chrono(dt.and_utc()))
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid {name}")))
}

pub(crate) fn hex(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}

pub(crate) fn iso(dt: bson::DateTime) -> String {
    dt.to_chrono().to_rfc3339()
}

pub(crate) fn validated<T: Validate>(body: T) -> Result<T, ApiError> {
    body.validate()?;
    Ok(body)
}

pub(crate) fn user_id(user: &User) -> Result<ObjectId, ApiError> {
    user.id.ok_or_else(ApiError::not_authenticated)
}

pub(crate) async fn load_team(state: &AppState, team_id: &str) -> Result<Team, ApiError> {
    let id = parse_id(team_id, "team_id")?;
    Ok(state.teams.find(id).await?)
}

pub(crate) fn ensure_view_team(user: &User, team: &Team) -> Result<(), ApiError> {
    if access::can_view_team(user, team) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You are not a member of this team"))
    }
}

pub(crate) fn ensure_manage_team(
    user: &User,
    team: &Team,
    permission: Permissions,
) -> Result<(), ApiError> {
    if access::can_manage_team(user, team, permission) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not have permission to manage this team"))
    }
}

pub(crate) fn ensure_organization_permission(
    user: &User,
    organization_id: ObjectId,
    permission: Permissions,
) -> Result<(), ApiError> {
    if access::has_organization_permission(user, organization_id, permission) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not have access to this organization"))
    }
}
