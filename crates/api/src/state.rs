use mongodb::Database;
use okrhub_config::Settings;
use okrhub_services::{
    EmailService, IdentityService, WebhookVerifier,
    dao::{
        audit_log::AuditLogDao, dependency::DependencyDao, invitation::InvitationDao,
        key_result::KeyResultDao, kpi::KpiDao, objective::ObjectiveDao,
        organization::OrganizationDao, team::TeamDao, template::TemplateDao, user::UserDao,
    },
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub identity: Arc<IdentityService>,
    pub identity_webhook: WebhookVerifier,
    /// `None` when `email.webhook_secret` is empty; the bounce route then answers 404.
    pub email_webhook: Option<WebhookVerifier>,
    pub email: Arc<EmailService>,
    pub users: Arc<UserDao>,
    pub organizations: Arc<OrganizationDao>,
    pub teams: Arc<TeamDao>,
    pub invitations: Arc<InvitationDao>,
    pub objectives: Arc<ObjectiveDao>,
    pub key_results: Arc<KeyResultDao>,
    pub kpis: Arc<KpiDao>,
    pub dependencies: Arc<DependencyDao>,
    pub audit_logs: Arc<AuditLogDao>,
    pub templates: Arc<TemplateDao>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> anyhow::Result<Self> {
        let identity = Arc::new(IdentityService::new(&settings.identity)?);
        let identity_webhook = WebhookVerifier::new(&settings.webhook.signing_secret)?;
        let email_webhook = if settings.email.webhook_secret.trim().is_empty() {
            None
        } else {
            Some(WebhookVerifier::new(&settings.email.webhook_secret)?)
        };
        let email = Arc::new(EmailService::new(&settings.email, &settings.app.public_url));

        Ok(Self {
            users: Arc::new(UserDao::new(&db)),
            organizations: Arc::new(OrganizationDao::new(&db)),
            teams: Arc::new(TeamDao::new(&db)),
            invitations: Arc::new(InvitationDao::new(&db)),
            objectives: Arc::new(ObjectiveDao::new(&db)),
            key_results: Arc::new(KeyResultDao::new(&db)),
            kpis: Arc::new(KpiDao::new(&db)),
            dependencies: Arc::new(DependencyDao::new(&db)),
            audit_logs: Arc::new(AuditLogDao::new(&db)),
            templates: Arc::new(TemplateDao::new(&db)),
            db,
            settings,
            identity,
            identity_webhook,
            email_webhook,
            email,
        })
    }
}
