use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use okrhub_config::IdentitySettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    MissingToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Invalid identity key: {0}")]
    InvalidKey(String),
}

/// Claims of an identity-provider session token. Profile fields are optional;
/// providers only include them when the session template asks for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Verifies identity tokens. Tokens are issued by the external provider; this
/// service never signs them.
pub struct IdentityService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityService {
    pub fn new(settings: &IdentitySettings) -> Result<Self, AuthError> {
        let (decoding_key, algorithm) = match settings.jwt_public_key_pem.as_deref() {
            Some(pem) if !pem.trim().is_empty() => (
                DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| AuthError::InvalidKey(e.to_string()))?,
                Algorithm::RS256,
            ),
            _ => (
                DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
                Algorithm::HS256,
            ),
        };

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&settings.issuer]);
        validation.validate_aud = false;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        Ok(token_data.claims)
    }
}
