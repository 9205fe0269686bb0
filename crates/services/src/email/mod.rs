pub mod templates;

use okrhub_config::EmailSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid email request: {0}")]
    Invalid(String),
    #[error("Email provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Email provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// Client of the transactional email API (`POST {api_url}/emails`).
#[derive(Clone)]
pub struct EmailService {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
    public_url: String,
}

impl EmailService {
    pub fn new(settings: &EmailSettings, public_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            from: settings.from.clone(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Sends one message and returns the provider's email id.
    pub async fn send(&self, to: &str, subject: &str, html: String) -> Result<String, EmailError> {
        let to = to.trim();
        if to.is_empty() || !to.contains('@') {
            return Err(EmailError::Invalid(format!("invalid recipient '{to}'")));
        }
        let message = OutgoingEmail {
            from: self.from.clone(),
            to: vec![to.to_string()],
            subject: subject.to_string(),
            html,
        };

        let resp = self
            .client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendResponse = resp.json().await?;
        info!(email_id = %sent.id, %to, subject, "Email sent");
        Ok(sent.id)
    }

    pub async fn send_welcome(
        &self,
        to: &str,
        name: &str,
        organization_name: &str,
    ) -> Result<String, EmailError> {
        let html = templates::welcome(name, organization_name, &self.public_url);
        self.send(to, &format!("Welcome to {organization_name} on OKRHub"), html)
            .await
    }

    pub fn invite_link(&self, token: &str) -> String {
        format!("{}/invite/{}", self.public_url, urlencoding::encode(token))
    }

    pub async fn send_invitation(
        &self,
        to: &str,
        invitee_name: &str,
        team_name: &str,
        inviter_name: &str,
        token: &str,
    ) -> Result<String, EmailError> {
        let html = templates::invitation(invitee_name, team_name, inviter_name, &self.invite_link(token));
        self.send(to, &format!("You're invited to join {team_name}"), html)
            .await
    }
}
