pub mod scheduler;

use std::sync::Arc;

use tracing::{error, info};

use crate::email::{EmailError, EmailService};

pub use scheduler::start_invitation_sweep;

/// Runs an email send on the runtime without waiting for it. Failures are
/// logged and never retried.
pub fn spawn_email<F>(kind: &'static str, recipient: String, fut: F)
where
    F: std::future::Future<Output = Result<String, EmailError>> + Send + 'static,
{
    tokio::spawn(async move {
        match fut.await {
            Ok(email_id) => info!(kind, %recipient, %email_id, "Background email sent"),
            Err(e) => error!(kind, %recipient, error = %e, "Background email failed"),
        }
    });
}

pub fn spawn_welcome_email(
    email: Arc<EmailService>,
    to: String,
    name: String,
    organization_name: String,
) {
    let recipient = to.clone();
    spawn_email("welcome", recipient, async move {
        email.send_welcome(&to, &name, &organization_name).await
    });
}

pub fn spawn_invitation_email(
    email: Arc<EmailService>,
    to: String,
    invitee_name: String,
    team_name: String,
    inviter_name: String,
    token: String,
) {
    let recipient = to.clone();
    spawn_email("invitation", recipient, async move {
        email
            .send_invitation(&to, &invitee_name, &team_name, &inviter_name, &token)
            .await
    });
}
