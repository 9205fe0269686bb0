use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use okrhub_services::{
    dao::{audit_log::AuditEntry, user::IdentityProfile},
    webhook::{
        EmailEventData, HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP, IdentityDeletedData,
        IdentityUserData, WebhookError, WebhookEvent, WebhookVerifier,
    },
};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::{error::ApiError, state::AppState};

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingHeader(name))
}

fn verify(verifier: &WebhookVerifier, headers: &HeaderMap, body: &[u8]) -> Result<WebhookEvent, ApiError> {
    verifier
        .verify(
            header(headers, HEADER_ID)?,
            header(headers, HEADER_TIMESTAMP)?,
            header(headers, HEADER_SIGNATURE)?,
            body,
            chrono::Utc::now().timestamp(),
        )
        .inspect_err(|e| warn!(error = %e, "Rejected webhook"))?;
    Ok(WebhookEvent::parse(body)?)
}

/// Identity-provider lifecycle events. Failures after verification are logged
/// and acknowledged so the provider does not retry them.
pub async fn identity(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let event = verify(&state.identity_webhook, &headers, &body)?;
    info!(event_type = %event.event_type, "Identity webhook received");

    let outcome = match event.event_type.as_str() {
        "user.created" | "user.updated" => upsert_user(&state, &event).await,
        "user.deleted" => delete_user(&state, &event).await,
        other => {
            info!(event_type = %other, "Ignoring identity event");
            Ok(())
        }
    };
    if let Err(e) = outcome {
        error!(event_type = %event.event_type, error = ?e, "Identity webhook handling failed");
    }

    Ok(Json(json!({ "received": true })))
}

async fn upsert_user(state: &AppState, event: &WebhookEvent) -> Result<(), ApiError> {
    let data: IdentityUserData = event.data_as()?;
    let Some(email) = data.primary_email() else {
        warn!(external_id = %data.id, "Identity user without an email address");
        return Ok(());
    };

    let user = state
        .users
        .sync_identity(
            IdentityProfile {
                external_id: data.id.clone(),
                email,
                name: data.display_name(),
                image_url: data.image_url.clone(),
            },
            state.settings.app.super_admin_email.as_deref(),
        )
        .await?;

    state
        .audit_logs
        .record(
            AuditEntry::by_webhook(&event.event_type, "user")
                .organization(user.organization_id)
                .target(user.id),
        )
        .await;
    Ok(())
}

async fn delete_user(state: &AppState, event: &WebhookEvent) -> Result<(), ApiError> {
    let data: IdentityDeletedData = event.data_as()?;
    let Some(external_id) = data.id else {
        return Ok(());
    };

    let user = state.users.find_by_external_id(&external_id).await.ok();
    let deleted = state.users.delete_by_external_id(&external_id).await?;
    info!(%external_id, deleted, "Identity user deleted");

    if let Some(user) = user {
        if let Some(user_id) = user.id {
            let teams = state.teams.remove_user_everywhere(user_id).await?;
            debug!(?user_id, teams, "Removed deleted user from teams");
        }
        state
            .audit_logs
            .record(
                AuditEntry::by_webhook("user.deleted", "user")
                    .organization(user.organization_id)
                    .target(user.id),
            )
            .await;
    }
    Ok(())
}

/// Delivery-status callbacks from the email provider.
pub async fn email(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let verifier = state
        .email_webhook
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("Email webhook is not configured".to_string()))?;
    let event = verify(verifier, &headers, &body)?;

    if event.event_type != "email.bounced" {
        return Ok(Json(json!({ "received": true, "bounced": 0 })));
    }

    let data: EmailEventData = event.data_as()?;
    let mut bounced = 0;
    for recipient in &data.to {
        match state.invitations.mark_bounced(recipient).await {
            Ok(count) => bounced += count,
            Err(e) => error!(%recipient, error = %e, "Failed to mark invitation bounced"),
        }
    }
    if bounced > 0 {
        state
            .audit_logs
            .record(AuditEntry::by_webhook("invitation.bounced", "invitation"))
            .await;
    }

    Ok(Json(json!({ "received": true, "bounced": bounced })))
}
