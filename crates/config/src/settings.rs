use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub identity: IdentitySettings,
    pub webhook: WebhookSettings,
    pub email: EmailSettings,
    pub invitations: InvitationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    /// Base URL of the web front end, used to build links in emails.
    pub public_url: String,
    pub cors_origins: Vec<String>,
    /// The one account that is promoted to super_admin on first sync.
    pub super_admin_email: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentitySettings {
    pub issuer: String,
    /// HS256 verification secret. Ignored when `jwt_public_key_pem` is set.
    pub jwt_secret: String,
    /// RS256 public key of the identity provider.
    pub jwt_public_key_pem: Option<String>,
    pub publishable_key: String,
    pub secret_key: String,
    pub sign_in_url: String,
    pub after_sign_in_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookSettings {
    pub signing_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailSettings {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    /// Secret for delivery-status callbacks (bounces). Empty disables the route.
    pub webhook_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InvitationSettings {
    pub ttl_days: i64,
    pub sweep_enabled: bool,
    pub sweep_cron: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("OKRHUB"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.public_url", "")?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("app.super_admin_email", None::<String>)?
            .set_default("database.url", "mongodb://localhost:27019")?
            .set_default("database.name", "okrhub")?
            .set_default("identity.issuer", "")?
            .set_default("identity.jwt_secret", "")?
            .set_default("identity.jwt_public_key_pem", None::<String>)?
            .set_default("identity.publishable_key", "")?
            .set_default("identity.secret_key", "")?
            .set_default("identity.sign_in_url", "/sign-in")?
            .set_default("identity.after_sign_in_url", "/auth-callback")?
            .set_default("webhook.signing_secret", "")?
            .set_default("email.api_url", "https://api.resend.com")?
            .set_default("email.api_key", "")?
            .set_default("email.from", "OKRHub <noreply@okrhub.app>")?
            .set_default("email.webhook_secret", "")?
            .set_default("invitations.ttl_days", 7)?
            .set_default("invitations.sweep_enabled", true)?
            .set_default("invitations.sweep_cron", "0 */15 * * * *")?
            .build()?;

        config.try_deserialize()
    }

    /// Rejects configurations with missing credentials. Called once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();

        let required = [
            ("app.public_url", &self.app.public_url),
            ("database.url", &self.database.url),
            ("identity.issuer", &self.identity.issuer),
            ("identity.publishable_key", &self.identity.publishable_key),
            ("identity.secret_key", &self.identity.secret_key),
            ("identity.sign_in_url", &self.identity.sign_in_url),
            ("identity.after_sign_in_url", &self.identity.after_sign_in_url),
            ("webhook.signing_secret", &self.webhook.signing_secret),
            ("email.api_key", &self.email.api_key),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                missing.push(key);
            }
        }

        let has_pem = self
            .identity
            .jwt_public_key_pem
            .as_deref()
            .is_some_and(|pem| !pem.trim().is_empty());
        if !has_pem && self.identity.jwt_secret.trim().is_empty() {
            missing.push("identity.jwt_secret | identity.jwt_public_key_pem");
        }

        if self.invitations.ttl_days <= 0 {
            return Err(ConfigError::Message(
                "invitations.ttl_days must be positive".to_string(),
            ));
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )))
        }
    }
}
