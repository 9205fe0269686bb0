use crate::fixtures::test_app::TestApp;
use serde_json::{Value, json};

#[tokio::test]
async fn self_service_signup_creates_active_organization() {
    let app = TestApp::spawn().await;
    let (org_id, admin) = app.create_organization("Acme", "a@acme.com").await;

    let resp = app
        .auth_get(&format!("/api/organizations/{}", org_id), &admin.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let org: Value = resp.json().await.unwrap();
    assert_eq!(org["name"], "Acme");
    assert_eq!(org["status"], "active");
    assert_eq!(org["subscription"]["status"], "active");
    assert_eq!(org["contact_person"]["email"], "a@acme.com");

    let me: Value = app
        .auth_get("/api/auth/me", &admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["role"], "org_admin");
    assert_eq!(me["organization_id"], org_id.as_str());
}

#[tokio::test]
async fn signup_sends_welcome_email() {
    let app = TestApp::spawn().await;
    app.create_organization("Acme", "a@acme.com").await;

    let sent = app.mailer.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["a@acme.com".to_string()]);
    assert!(sent[0].subject.contains("Acme"));
    assert!(sent[0].html.contains("https://app.okrhub.test"));
}

#[tokio::test]
async fn account_with_organization_cannot_sign_up_again() {
    let app = TestApp::spawn().await;
    let (_, admin) = app.create_organization("Acme", "a@acme.com").await;

    let resp = app
        .auth_post("/api/organizations", &admin.token)
        .json(&json!({ "name": "Second" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn concurrent_signups_create_one_organization() {
    let app = TestApp::spawn().await;
    let user = app.sign_in("user_twin", "twin@acme.com", "Twin").await;

    let (first, second) = tokio::join!(
        app.auth_post("/api/organizations", &user.token)
            .json(&json!({ "name": "Twin One" }))
            .send(),
        app.auth_post("/api/organizations", &user.token)
            .json(&json!({ "name": "Twin Two" }))
            .send(),
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    let mut statuses = vec![first.status().as_u16(), second.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![201, 409]);

    let winner = if first.status().as_u16() == 201 { first } else { second };
    let created: Value = winner.json().await.unwrap();
    let me: Value = app
        .auth_get("/api/auth/me", &user.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["organization_id"], created["id"]);

    let stored = app
        .db
        .collection::<bson::Document>("organizations")
        .count_documents(bson::doc! {})
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn super_admin_onboards_organization_with_placeholder_admin() {
    let app = TestApp::spawn().await;
    let root = app.sign_in_super_admin().await;

    let resp = app
        .auth_post("/api/admin/organizations", &root.token)
        .json(&json!({
            "name": "Acme",
            "contact_name": "Ada",
            "admin_email": "A@Acme.com",
            "admin_name": "Ada Admin",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["organization"]["status"], "active");
    assert_eq!(json["organization"]["subscription"]["status"], "active");
    assert_eq!(json["admin"]["email"], "a@acme.com");
    assert_eq!(json["admin"]["role"], "org_admin");
    assert_eq!(json["admin"]["pending_identity"], true);
    let org_id = json["organization"]["id"].as_str().unwrap().to_string();

    // The admin's first sign-in claims the placeholder.
    let admin = app.sign_in("user_ada", "a@acme.com", "Ada").await;
    assert_eq!(admin.id, json["admin"]["id"].as_str().unwrap());
    let me: Value = app
        .auth_get("/api/auth/me", &admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["role"], "org_admin");
    assert_eq!(me["organization_id"], org_id.as_str());
    assert_eq!(me["pending_identity"], false);

    let landing: Value = app
        .auth_get("/api/auth/landing", &admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(landing["route"], "/Acme");
}

#[tokio::test]
async fn onboarding_an_existing_email_conflicts() {
    let app = TestApp::spawn().await;
    let root = app.sign_in_super_admin().await;
    app.sign_in("user_taken", "taken@acme.com", "Taken").await;

    let resp = app
        .auth_post("/api/admin/organizations", &root.token)
        .json(&json!({
            "name": "Acme",
            "contact_name": "Ada",
            "admin_email": "taken@acme.com",
            "admin_name": "Ada",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn only_super_admin_onboards_organizations() {
    let app = TestApp::spawn().await;
    let (_, admin) = app.create_organization("Acme", "a@acme.com").await;

    let resp = app
        .auth_post("/api/admin/organizations", &admin.token)
        .json(&json!({
            "name": "Other",
            "contact_name": "Bo",
            "admin_email": "bo@other.com",
            "admin_name": "Bo",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn organizations_are_isolated() {
    let app = TestApp::spawn().await;
    let (acme_id, _) = app.create_organization("Acme", "a@acme.com").await;
    let (_, globex_admin) = app.create_organization("Globex", "g@globex.com").await;

    let resp = app
        .auth_get(&format!("/api/organizations/{}", acme_id), &globex_admin.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let own: Vec<Value> = app
        .auth_get("/api/organizations", &globex_admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["name"], "Globex");

    let root = app.sign_in_super_admin().await;
    let all: Vec<Value> = app
        .auth_get("/api/organizations", &root.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn billing_fields_are_super_admin_only() {
    let app = TestApp::spawn().await;
    let (org_id, admin) = app.create_organization("Acme", "a@acme.com").await;
    let path = format!("/api/organizations/{}", org_id);

    let resp = app
        .auth_put(&path, &admin.token)
        .json(&json!({ "plan": "enterprise" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_put(&path, &admin.token)
        .json(&json!({ "name": "Acme Labs" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let org: Value = resp.json().await.unwrap();
    assert_eq!(org["name"], "Acme Labs");

    let root = app.sign_in_super_admin().await;
    let resp = app
        .auth_put(&path, &root.token)
        .json(&json!({ "status": "inactive", "plan": "enterprise" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let org: Value = resp.json().await.unwrap();
    assert_eq!(org["status"], "inactive");
    assert_eq!(org["subscription"]["plan"], "enterprise");
}

#[tokio::test]
async fn org_admin_creates_placeholder_users() {
    let app = TestApp::spawn().await;
    let (org_id, admin) = app.create_organization("Acme", "a@acme.com").await;
    let path = format!("/api/organizations/{}/users", org_id);

    let resp = app
        .auth_post(&path, &admin.token)
        .json(&json!({ "email": "lead@acme.com", "name": "Lead", "role": "team_leader" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app
        .auth_post(&path, &admin.token)
        .json(&json!({ "email": "boss@acme.com", "name": "Boss", "role": "super_admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let users: Vec<Value> = app
        .auth_get(&path, &admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn super_admin_role_cannot_be_granted() {
    let app = TestApp::spawn().await;
    let root = app.sign_in_super_admin().await;
    let (_, admin) = app.create_organization("Acme", "a@acme.com").await;

    let resp = app
        .auth_put(&format!("/api/users/{}/role", admin.id), &root.token)
        .json(&json!({ "role": "super_admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_put(&format!("/api/users/{}/role", admin.id), &root.token)
        .json(&json!({ "role": "team_leader" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["role"], "team_leader");

    let resp = app
        .auth_put(&format!("/api/users/{}/role", root.id), &admin.token)
        .json(&json!({ "role": "pending" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}
