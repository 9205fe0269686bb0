use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use okrhub_db::models::User;
use okrhub_services::{auth::Claims, dao::base::DaoError};

use crate::{error::ApiError, state::AppState};

/// Session cookie set by the identity provider's front-end SDK.
const SESSION_COOKIE: &str = "__session";

/// A verified identity token (cookie or Authorization header). The subject may
/// not have a local account yet; see `CurrentUser`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub external_id: String,
    pub claims: Claims,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .or_else(|| {
            parts
                .headers
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| {
                    cookies.split(';').find_map(|cookie| {
                        cookie
                            .trim()
                            .strip_prefix(SESSION_COOKIE)
                            .and_then(|rest| rest.strip_prefix('='))
                            .map(|s| s.to_string())
                    })
                })
        })
        .filter(|t| !t.is_empty())
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(parts).ok_or_else(ApiError::not_authenticated)?;
        let claims = app_state.identity.verify_token(&token)?;

        Ok(AuthUser {
            external_id: claims.sub.clone(),
            claims,
        })
    }
}

/// The local account behind a verified token. Callers that never ran
/// `/api/auth/sync` get `401 Not authenticated`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        let app_state = AppState::from_ref(state);
        match app_state.users.find_by_external_id(&auth.external_id).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(DaoError::NotFound) => Err(ApiError::not_authenticated()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Helper trait for extracting AppState from composite state types
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AppState> for AppState {
    fn from_ref(input: &AppState) -> Self {
        input.clone()
    }
}
