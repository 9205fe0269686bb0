use crate::fixtures::test_app::TestApp;
use serde_json::{Value, json};

#[tokio::test]
async fn creator_leads_new_team() {
    let app = TestApp::spawn().await;
    let (org_id, admin) = app.create_organization("Acme", "a@acme.com").await;
    let team_id = app.create_team(&org_id, &admin.token, "Growth").await;

    let team: Value = app
        .auth_get(&format!("/api/teams/{}", team_id), &admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(team["name"], "Growth");
    assert_eq!(team["leader_id"], admin.id.as_str());
    assert_eq!(team["members"].as_array().unwrap().len(), 1);
    assert_eq!(team["members"][0]["role"], "leader");
}

#[tokio::test]
async fn pending_user_cannot_create_team() {
    let app = TestApp::spawn().await;
    let (org_id, _) = app.create_organization("Acme", "a@acme.com").await;
    let outsider = app.sign_in("user_out", "out@test.com", "Out").await;

    let resp = app
        .auth_post(&format!("/api/organizations/{}/teams", org_id), &outsider.token)
        .json(&json!({ "name": "Rogue" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn members_only_list_their_own_teams() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    app.create_team(&org.organization_id, &org.admin.token, "Finance")
        .await;
    let path = format!("/api/organizations/{}/teams", org.organization_id);

    let admin_view: Vec<Value> = app
        .auth_get(&path, &org.admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(admin_view.len(), 2);

    let member_view: Vec<Value> = app
        .auth_get(&path, &org.member.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(member_view.len(), 1);
    assert_eq!(member_view[0]["id"], org.team_id.as_str());
}

#[tokio::test]
async fn non_member_cannot_view_team() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    let finance = app
        .create_team(&org.organization_id, &org.admin.token, "Finance")
        .await;

    let resp = app
        .auth_get(&format!("/api/teams/{}", finance), &org.member.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn member_cannot_manage_team() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    let path = format!("/api/teams/{}", org.team_id);

    let resp = app
        .auth_put(&path, &org.member.token)
        .json(&json!({ "name": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app.auth_delete(&path, &org.member.token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_put(&path, &org.admin.token)
        .json(&json!({ "name": "Growth Team" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let team: Value = resp.json().await.unwrap();
    assert_eq!(team["name"], "Growth Team");
}

#[tokio::test]
async fn add_and_remove_members() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    let finance = app
        .create_team(&org.organization_id, &org.admin.token, "Finance")
        .await;
    let members_path = format!("/api/teams/{}/members", finance);

    let resp = app
        .auth_post(&members_path, &org.admin.token)
        .json(&json!({ "user_id": org.member.id, "role": "leader" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let team: Value = resp.json().await.unwrap();
    assert_eq!(team["members"].as_array().unwrap().len(), 2);

    // Leading a team raises the global role.
    let me: Value = app
        .auth_get("/api/auth/me", &org.member.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["role"], "team_leader");

    let resp = app
        .auth_post(&members_path, &org.admin.token)
        .json(&json!({ "user_id": org.member.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    let resp = app
        .auth_delete(&format!("{}/{}", members_path, org.member.id), &org.admin.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let team: Value = resp.json().await.unwrap();
    assert_eq!(team["members"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn users_from_other_organizations_cannot_be_added() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;
    let globex = app.seed_organization("globex").await;

    let resp = app
        .auth_post(&format!("/api/teams/{}/members", acme.team_id), &acme.admin.token)
        .json(&json!({ "user_id": globex.member.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn deleted_team_is_gone() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    let path = format!("/api/teams/{}", org.team_id);

    let resp = app.auth_delete(&path, &org.admin.token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = app.auth_get(&path, &org.admin.token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
