pub mod access;
pub mod analytics;
pub mod auth;
pub mod background;
pub mod dao;
pub mod email;
pub mod graph;
pub mod progress;
pub mod routing;
pub mod webhook;

pub use auth::IdentityService;
pub use dao::*;
pub use email::EmailService;
pub use webhook::WebhookVerifier;
