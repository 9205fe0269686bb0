use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use okrhub_db::models::{
    AuditChange, ContactPerson, Organization, OrganizationStatus, Permissions, Plan, Role,
    SubscriptionStatus,
};
use okrhub_services::{
    background::spawn_welcome_email,
    dao::{audit_log::AuditEntry, base::DaoError, organization::OrganizationUpdate},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    ensure_organization_permission, hex, iso, parse_date, parse_id, user::UserResponse, user_id,
    validated,
};
use crate::{error::ApiError, extractors::auth::CurrentUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub start_date: String,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub id: String,
    pub name: String,
    pub contact_person: ContactResponse,
    pub status: OrganizationStatus,
    pub subscription: SubscriptionResponse,
    pub created_at: String,
}

impl From<Organization> for OrganizationResponse {
    fn from(org: Organization) -> Self {
        Self {
            id: hex(org.id),
            name: org.name,
            contact_person: ContactResponse {
                name: org.contact_person.name,
                email: org.contact_person.email,
            },
            status: org.status,
            subscription: SubscriptionResponse {
                plan: org.subscription.plan,
                status: org.subscription.status,
                start_date: iso(org.subscription.start_date),
                end_date: org.subscription.end_date.map(iso),
            },
            created_at: iso(org.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub plan: Plan,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateOrganizationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub contact_name: String,
    #[validate(email)]
    pub admin_email: String,
    #[validate(length(min = 1, max = 100))]
    pub admin_name: String,
    #[serde(default)]
    pub plan: Plan,
}

#[derive(Debug, Serialize)]
pub struct AdminCreateOrganizationResponse {
    pub organization: OrganizationResponse,
    pub admin: UserResponse,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    pub status: Option<OrganizationStatus>,
    pub plan: Option<Plan>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub subscription_end_date: Option<String>,
}

/// Self-service signup: a pending account creates its organization and
/// becomes its admin.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationResponse>), ApiError> {
    let body = validated(body)?;
    let uid = user_id(&user)?;
    if user.role != Role::Pending || user.organization_id.is_some() {
        return Err(ApiError::Conflict(
            "You already belong to an organization".to_string(),
        ));
    }

    let contact = ContactPerson {
        name: body.contact_name.unwrap_or_else(|| user.name.clone()),
        email: body.contact_email.unwrap_or_else(|| user.email.clone()),
    };
    let org = state
        .organizations
        .create(&body.name, contact, body.plan, Some(uid))
        .await?;
    let org_id = org.id.ok_or(DaoError::NotFound)?;
    if let Err(e) = state
        .users
        .assign_organization(uid, org_id, Role::OrgAdmin)
        .await
    {
        // A concurrent signup won; drop the orphaned organization.
        state
            .organizations
            .base
            .hard_delete(bson::doc! { "_id": org_id })
            .await?;
        return Err(e.into());
    }

    state
        .audit_logs
        .record(
            AuditEntry::by_user(Some(uid), "organization.created", "organization")
                .organization(Some(org_id))
                .target(Some(org_id))
                .change(AuditChange::set("name", org.name.clone().into())),
        )
        .await;
    spawn_welcome_email(
        state.email.clone(),
        user.email.clone(),
        user.name.clone(),
        org.name.clone(),
    );

    Ok((StatusCode::CREATED, Json(org.into())))
}

/// Super admin onboarding: creates the organization and a placeholder admin
/// account that is claimed when the admin first signs in.
pub async fn admin_create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<AdminCreateOrganizationRequest>,
) -> Result<(StatusCode, Json<AdminCreateOrganizationResponse>), ApiError> {
    if user.role != Role::SuperAdmin {
        return Err(ApiError::forbidden("Only the super admin can create organizations"));
    }
    let body = validated(body)?;

    let admin_email = body.admin_email.trim().to_lowercase();
    if state.users.base.find_one(bson::doc! { "email": &admin_email }).await?.is_some() {
        return Err(ApiError::Conflict(format!("{admin_email} already has an account")));
    }

    let org = state
        .organizations
        .create(
            &body.name,
            ContactPerson {
                name: body.contact_name.trim().to_string(),
                email: admin_email.clone(),
            },
            body.plan,
            user.id,
        )
        .await?;
    let org_id = org.id.ok_or(DaoError::NotFound)?;
    let admin = state
        .users
        .create_placeholder(&admin_email, body.admin_name.trim(), Role::OrgAdmin, org_id)
        .await?;

    state
        .audit_logs
        .record(
            AuditEntry::by_user(user.id, "organization.created", "organization")
                .organization(Some(org_id))
                .target(Some(org_id))
                .change(AuditChange::set("name", org.name.clone().into()))
                .change(AuditChange::set("admin_email", admin_email.clone().into())),
        )
        .await;
    spawn_welcome_email(
        state.email.clone(),
        admin_email,
        admin.name.clone(),
        org.name.clone(),
    );

    Ok((
        StatusCode::CREATED,
        Json(AdminCreateOrganizationResponse {
            organization: org.into(),
            admin: admin.into(),
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<OrganizationResponse>>, ApiError> {
    let orgs = if user.role == Role::SuperAdmin {
        state.organizations.list_all().await?
    } else {
        match user.organization_id {
            Some(org_id) => vec![state.organizations.base.find_by_id(org_id).await?],
            None => Vec::new(),
        }
    };
    Ok(Json(orgs.into_iter().map(OrganizationResponse::from).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(organization_id): Path<String>,
) -> Result<Json<OrganizationResponse>, ApiError> {
    let org_id = parse_id(&organization_id, "organization_id")?;
    ensure_organization_permission(&user, org_id, Permissions::VIEW_ORGANIZATION)?;

    let org = state.organizations.base.find_by_id(org_id).await?;
    Ok(Json(org.into()))
}

/// Org admins edit name and contact; status and subscription are super admin only.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(organization_id): Path<String>,
    Json(body): Json<UpdateOrganizationRequest>,
) -> Result<Json<OrganizationResponse>, ApiError> {
    let org_id = parse_id(&organization_id, "organization_id")?;
    let body = validated(body)?;
    let is_super_admin = user.role == Role::SuperAdmin;
    if !is_super_admin && !(user.role == Role::OrgAdmin && user.belongs_to(org_id)) {
        return Err(ApiError::forbidden("Only organization admins can edit the organization"));
    }

    let current = state.organizations.base.find_by_id(org_id).await?;
    let contact_person = match (body.contact_name, body.contact_email) {
        (None, None) => None,
        (name, email) => Some(ContactPerson {
            name: name.unwrap_or_else(|| current.contact_person.name.clone()),
            email: email
                .map(|e| e.trim().to_lowercase())
                .unwrap_or_else(|| current.contact_person.email.clone()),
        }),
    };
    let update = OrganizationUpdate {
        name: body.name,
        contact_person,
        status: body.status,
        plan: body.plan,
        subscription_status: body.subscription_status,
        subscription_end_date: body
            .subscription_end_date
            .as_deref()
            .map(|d| parse_date(d, "subscription_end_date"))
            .transpose()?,
    };
    if update.touches_billing() && !is_super_admin {
        return Err(ApiError::forbidden(
            "Only the super admin can change status or subscription",
        ));
    }

    let org = state.organizations.update(org_id, &update).await?;

    let mut entry = AuditEntry::by_user(user.id, "organization.updated", "organization")
        .organization(Some(org_id))
        .target(Some(org_id));
    if let Some(name) = &update.name {
        entry = entry.change(AuditChange::diff("name", current.name.into(), name.clone().into()));
    }
    if let Some(status) = update.status {
        entry = entry.change(AuditChange::diff(
            "status",
            serde_json::to_value(current.status).unwrap_or_default(),
            serde_json::to_value(status).unwrap_or_default(),
        ));
    }
    if let Some(plan) = update.plan {
        entry = entry.change(AuditChange::diff(
            "subscription.plan",
            serde_json::to_value(current.subscription.plan).unwrap_or_default(),
            serde_json::to_value(plan).unwrap_or_default(),
        ));
    }
    if let Some(status) = update.subscription_status {
        entry = entry.change(AuditChange::diff(
            "subscription.status",
            serde_json::to_value(current.subscription.status).unwrap_or_default(),
            serde_json::to_value(status).unwrap_or_default(),
        ));
    }
    state.audit_logs.record(entry).await;

    Ok(Json(org.into()))
}
