use crate::fixtures::{seed::identity_token, test_app::TestApp};
use serde_json::{Value, json};

#[tokio::test]
async fn welcome_email_returns_provider_id() {
    let app = TestApp::spawn().await;
    let token = identity_token("user_ada", "ada@acme.test", "Ada");

    let resp = app
        .auth_post("/api/send-welcome-email", &token)
        .json(&json!({ "email": "ada@acme.test", "orgName": "Acme", "name": "Ada" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["emailId"], "email_1");

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["ada@acme.test".to_string()]);
    assert!(sent[0].subject.contains("Acme"));
    assert!(sent[0].html.contains("Hi Ada"));
}

#[tokio::test]
async fn welcome_email_requires_all_fields() {
    let app = TestApp::spawn().await;
    let token = identity_token("user_ada", "ada@acme.test", "Ada");

    let resp = app
        .auth_post("/api/send-welcome-email", &token)
        .json(&json!({ "email": "ada@acme.test", "name": "Ada" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["details"].as_str().unwrap().contains("orgName"));

    let resp = app
        .auth_post("/api/send-welcome-email", &token)
        .json(&json!({ "email": "not-an-email", "orgName": "Acme", "name": "Ada" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn provider_failure_is_reported() {
    let app = TestApp::spawn().await;
    app.mailer.reject_all();
    let token = identity_token("user_ada", "ada@acme.test", "Ada");

    let resp = app
        .auth_post("/api/send-welcome-email", &token)
        .json(&json!({ "email": "ada@acme.test", "orgName": "Acme", "name": "Ada" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 502);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "EMAIL_SEND_FAILED");
    assert!(json["details"].as_str().unwrap().contains("422"));
}

#[tokio::test]
async fn welcome_email_requires_a_session() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/send-welcome-email"))
        .json(&json!({ "email": "ada@acme.test", "orgName": "Acme", "name": "Ada" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}
