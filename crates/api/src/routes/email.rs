use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use okrhub_services::email::EmailError;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use validator::Validate;

use crate::{extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeEmailRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub org_name: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

fn failure(status: StatusCode, code: &str, error: &str, details: String) -> Response {
    (
        status,
        Json(json!({ "error": error, "details": details, "code": code })),
    )
        .into_response()
}

/// Sends the welcome email synchronously and reports the provider's email id.
/// Answers with its own `{success, data}` / `{error, details, code}` envelope.
pub async fn send_welcome(
    State(state): State<AppState>,
    _auth: AuthUser,
    body: Bytes,
) -> Response {
    let request = match serde_json::from_slice::<WelcomeEmailRequest>(&body) {
        Ok(request) => request,
        Err(e) => {
            return failure(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Missing required fields: email, orgName, name",
                e.to_string(),
            );
        }
    };
    if let Err(e) = request.validate() {
        return failure(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Invalid request",
            e.to_string(),
        );
    }

    match state
        .email
        .send_welcome(&request.email, request.name.trim(), request.org_name.trim())
        .await
    {
        Ok(email_id) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": { "emailId": email_id } })),
        )
            .into_response(),
        Err(EmailError::Invalid(details)) => failure(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Invalid request",
            details,
        ),
        Err(EmailError::Transport(e)) if e.is_builder() => {
            error!(error = %e, "Welcome email request could not be built");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "Internal server error",
                e.to_string(),
            )
        }
        Err(e @ (EmailError::Rejected { .. } | EmailError::Transport(_))) => {
            error!(error = %e, "Welcome email failed");
            failure(
                StatusCode::BAD_GATEWAY,
                "EMAIL_SEND_FAILED",
                "Failed to send welcome email",
                e.to_string(),
            )
        }
    }
}
