use okrhub_api::{build_router, state::AppState};
use okrhub_config::Settings;
use okrhub_db::{connect, indexes::ensure_indexes};
use okrhub_services::background::start_invitation_sweep;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "okrhub_api=debug,okrhub_services=debug,okrhub_db=debug,tower_http=debug".into()
    });
    // LOG_FORMAT=json for log shippers; human-readable otherwise
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let settings = Settings::load()?;
    settings.validate()?;
    info!("Starting OKRHub API on {}:{}", settings.app.host, settings.app.port);

    let db = connect(&settings).await?;
    ensure_indexes(&db).await?;

    let app_state = AppState::new(db, settings.clone())?;

    // Held for the lifetime of the server; dropping it stops the jobs.
    let _sweep = if settings.invitations.sweep_enabled {
        Some(
            start_invitation_sweep(app_state.invitations.clone(), &settings.invitations.sweep_cron)
                .await?,
        )
    } else {
        None
    };

    let app = build_router(app_state);

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
