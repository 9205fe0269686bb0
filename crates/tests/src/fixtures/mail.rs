use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// A message captured by [`MockMailer`].
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Clone, Default)]
struct MailState {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    reject: Arc<Mutex<bool>>,
}

/// Stand-in for the transactional email API: accepts `POST /emails` and
/// records every message.
pub struct MockMailer {
    pub url: String,
    state: MailState,
}

async fn send(State(state): State<MailState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if *state.reject.lock() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "domain not verified" })),
        );
    }
    let to = body["to"]
        .as_array()
        .map(|v| v.iter().filter_map(|s| s.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    let mut sent = state.sent.lock();
    sent.push(SentEmail {
        to,
        subject: body["subject"].as_str().unwrap_or_default().to_string(),
        html: body["html"].as_str().unwrap_or_default().to_string(),
    });
    let id = format!("email_{}", sent.len());
    (StatusCode::OK, Json(json!({ "id": id })))
}

impl MockMailer {
    pub async fn spawn() -> Self {
        let state = MailState::default();
        let app = Router::new()
            .route("/emails", post(send))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock mailer");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.state.sent.lock().clone()
    }

    /// Makes the provider answer every send with a 422.
    pub fn reject_all(&self) {
        *self.state.reject.lock() = true;
    }

    /// Polls until `count` messages arrived; background sends are fire-and-forget.
    pub async fn wait_for(&self, count: usize) -> Vec<SentEmail> {
        for _ in 0..50 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        self.sent()
    }
}
