//! Verification of svix-signed webhooks (identity lifecycle and email status).

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const TIMESTAMP_TOLERANCE_SECONDS: i64 = 300;
const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Missing webhook header: {0}")]
    MissingHeader(&'static str),
    #[error("Invalid webhook secret")]
    InvalidSecret,
    #[error("Webhook timestamp outside the tolerance window")]
    StaleTimestamp,
    #[error("Invalid webhook signature")]
    InvalidSignature,
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Result<Self, WebhookError> {
        let encoded = secret.trim().strip_prefix(SECRET_PREFIX).unwrap_or(secret.trim());
        if encoded.is_empty() {
            return Err(WebhookError::InvalidSecret);
        }
        let key = BASE64
            .decode(encoded)
            .map_err(|_| WebhookError::InvalidSecret)?;
        Ok(Self { key })
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, WebhookError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.key)
            .map_err(|_| WebhookError::InvalidSecret)?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }

    /// `v1,<base64>` signature for the given message.
    pub fn sign(&self, id: &str, timestamp: i64, body: &[u8]) -> Result<String, WebhookError> {
        let digest = self.mac(id, &timestamp.to_string(), body)?.finalize().into_bytes();
        Ok(format!("{SIGNATURE_VERSION},{}", BASE64.encode(digest)))
    }

    /// Checks the timestamp window and that at least one `v1` entry of the
    /// space-separated signature header matches.
    pub fn verify(
        &self,
        id: &str,
        timestamp: &str,
        signatures: &str,
        body: &[u8],
        now: i64,
    ) -> Result<(), WebhookError> {
        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| WebhookError::StaleTimestamp)?;
        if (now - sent_at).abs() > TIMESTAMP_TOLERANCE_SECONDS {
            return Err(WebhookError::StaleTimestamp);
        }

        let mac = self.mac(id, timestamp.trim(), body)?;
        let valid = signatures
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| BASE64.decode(sig).ok())
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());

        if valid {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl WebhookEvent {
    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn data_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, WebhookError> {
        Ok(T::deserialize(&self.data)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEmailAddress {
    pub id: String,
    pub email_address: String,
}

/// `data` of `user.created` / `user.updated` identity events.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityUserData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<IdentityEmailAddress>,
    pub primary_email_address_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

impl IdentityUserData {
    pub fn primary_email(&self) -> Option<String> {
        let primary = self.primary_email_address_id.as_deref();
        self.email_addresses
            .iter()
            .find(|e| Some(e.id.as_str()) == primary)
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.trim().to_lowercase())
    }

    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            return self
                .primary_email()
                .and_then(|e| e.split('@').next().map(str::to_string))
                .unwrap_or_default();
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityDeletedData {
    pub id: Option<String>,
}

/// `data` of email delivery events such as `email.bounced`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailEventData {
    #[serde(default)]
    pub email_id: Option<String>,
    #[serde(default)]
    pub to: Vec<String>,
}
