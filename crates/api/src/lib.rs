pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post, put},
};
use state::AppState;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if parsed.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(parsed)
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.app.cors_origins);

    // Identity session routes
    let auth_routes = Router::new()
        .route("/sync", post(routes::auth::sync))
        .route("/me", get(routes::auth::me))
        .route("/landing", get(routes::auth::landing));

    // Organizations, their users, teams, dependencies and reporting
    let organization_routes = Router::new()
        .route(
            "/",
            get(routes::organization::list).post(routes::organization::create),
        )
        .route(
            "/{organization_id}",
            get(routes::organization::get).put(routes::organization::update),
        )
        .route(
            "/{organization_id}/users",
            get(routes::user::list).post(routes::user::create),
        )
        .route(
            "/{organization_id}/teams",
            get(routes::team::list).post(routes::team::create),
        )
        .route(
            "/{organization_id}/dependencies",
            get(routes::dependency::graph).post(routes::dependency::create),
        )
        .route(
            "/{organization_id}/analytics",
            get(routes::analytics::organization),
        )
        .route(
            "/{organization_id}/audit-logs",
            get(routes::audit_log::list_for_organization),
        );

    let admin_routes = Router::new()
        .route("/organizations", post(routes::organization::admin_create))
        .route("/audit-logs", get(routes::audit_log::list_all));

    let team_routes = Router::new()
        .route(
            "/{team_id}",
            get(routes::team::get)
                .put(routes::team::update)
                .delete(routes::team::delete),
        )
        .route("/{team_id}/members", post(routes::team::add_member))
        .route(
            "/{team_id}/members/{user_id}",
            delete(routes::team::remove_member),
        )
        .route(
            "/{team_id}/invitations",
            get(routes::invitation::list).post(routes::invitation::create),
        )
        .route(
            "/{team_id}/objectives",
            get(routes::objective::list).post(routes::objective::create),
        )
        .route("/{team_id}/analytics", get(routes::analytics::team))
        .route("/{team_id}/timeline", get(routes::analytics::timeline));

    // Token-addressed invitation routes; the lookup is public
    let invitation_routes = Router::new()
        .route("/expire", post(routes::invitation::expire))
        .route("/{token}", get(routes::invitation::get_by_token))
        .route("/{token}/accept", post(routes::invitation::accept));

    let objective_routes = Router::new()
        .route(
            "/{objective_id}",
            get(routes::objective::get)
                .put(routes::objective::update)
                .delete(routes::objective::delete),
        )
        .route(
            "/{objective_id}/milestones",
            post(routes::objective::add_milestone),
        )
        .route(
            "/{objective_id}/milestones/{milestone_id}",
            put(routes::objective::update_milestone),
        )
        .route(
            "/{objective_id}/key-results",
            get(routes::key_result::list).post(routes::key_result::create),
        );

    let key_result_routes = Router::new()
        .route(
            "/{key_result_id}",
            get(routes::key_result::get)
                .put(routes::key_result::update)
                .delete(routes::key_result::delete),
        )
        .route(
            "/{key_result_id}/kpis",
            get(routes::kpi::list).post(routes::kpi::create),
        );

    let kpi_routes = Router::new()
        .route(
            "/{kpi_id}",
            get(routes::kpi::get)
                .put(routes::kpi::update)
                .delete(routes::kpi::delete),
        )
        .route("/{kpi_id}/value", put(routes::kpi::update_value));

    let template_routes = Router::new()
        .route(
            "/",
            get(routes::template::list).post(routes::template::create),
        )
        .route("/{template_id}", delete(routes::template::delete))
        .route("/{template_id}/apply", post(routes::template::apply));

    // Signed provider callbacks (no session)
    let webhook_routes = Router::new()
        .route("/clerk-webhooks", post(routes::webhook::identity))
        .route("/webhooks/email", post(routes::webhook::email));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/organizations", organization_routes)
        .nest("/admin", admin_routes)
        .nest("/teams", team_routes)
        .nest("/invitations", invitation_routes)
        .nest("/objectives", objective_routes)
        .nest("/key-results", key_result_routes)
        .nest("/kpis", kpi_routes)
        .nest("/templates", template_routes)
        .route("/users/{user_id}/role", put(routes::user::set_role))
        .route("/dependencies/{dependency_id}", delete(routes::dependency::delete))
        .route("/send-welcome-email", post(routes::email::send_welcome))
        .merge(webhook_routes);

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
