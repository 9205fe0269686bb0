use crate::fixtures::{seed::SeededOrganization, test_app::TestApp};
use serde_json::{Value, json};

/// One objective at 50% (a key result halfway) and one finished objective.
async fn seed_progress(app: &TestApp, org: &SeededOrganization) -> (String, String) {
    let halfway = app
        .create_objective(&org.team_id, &org.admin.token, "Halfway")
        .await;
    app.auth_post(&format!("/api/objectives/{}/key-results", halfway), &org.admin.token)
        .json(&json!({ "title": "Half", "current_value": 5.0, "target_value": 10.0 }))
        .send()
        .await
        .unwrap();

    let resp = app
        .auth_post(&format!("/api/teams/{}/objectives", org.team_id), &org.admin.token)
        .json(&json!({
            "title": "Done",
            "start_date": "2025-10-01",
            "end_date": "2025-12-31",
        }))
        .send()
        .await
        .unwrap();
    let done: Value = resp.json().await.unwrap();
    let done = done["id"].as_str().unwrap().to_string();
    app.auth_post(&format!("/api/objectives/{}/key-results", done), &org.admin.token)
        .json(&json!({ "title": "Full", "current_value": 10.0, "target_value": 10.0 }))
        .send()
        .await
        .unwrap();

    (halfway, done)
}

#[tokio::test]
async fn team_analytics_counts_statuses() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    seed_progress(&app, &org).await;
    let path = format!("/api/teams/{}/analytics", org.team_id);

    let resp = app.auth_get(&path, &org.member.token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app.auth_get(&path, &org.admin.token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let summary: Value = resp.json().await.unwrap();
    assert_eq!(summary["team_name"], "Growth");
    assert_eq!(summary["objectives"]["at_risk"], 1);
    assert_eq!(summary["objectives"]["completed"], 1);
    assert_eq!(summary["key_results"]["completed"], 1);
    assert_eq!(summary["average_objective_progress"], 75.0);
}

#[tokio::test]
async fn team_leaders_see_their_team_analytics() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    let lead = app
        .join_team(&org.team_id, &org.admin.token, "lead@acme.test", "leader")
        .await;

    let resp = app
        .auth_get(&format!("/api/teams/{}/analytics", org.team_id), &lead.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_get(&format!("/api/organizations/{}/analytics", org.organization_id), &lead.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn organization_analytics_merges_teams() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    seed_progress(&app, &org).await;
    let finance = app
        .create_team(&org.organization_id, &org.admin.token, "Finance")
        .await;
    app.create_objective(&finance, &org.admin.token, "Budget").await;

    let resp = app
        .auth_get(
            &format!("/api/organizations/{}/analytics", org.organization_id),
            &org.admin.token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let summary: Value = resp.json().await.unwrap();
    assert_eq!(summary["teams"].as_array().unwrap().len(), 2);
    assert_eq!(summary["objectives"]["not_started"], 1);
    assert_eq!(summary["objectives"]["completed"], 1);
    assert_eq!(summary["average_objective_progress"], 50.0);

    let other = app.seed_organization("globex").await;
    let resp = app
        .auth_get(
            &format!("/api/organizations/{}/analytics", org.organization_id),
            &other.admin.token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn timeline_is_ordered_by_start_date() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    let (halfway, done) = seed_progress(&app, &org).await;

    let timeline: Vec<Value> = app
        .auth_get(&format!("/api/teams/{}/timeline", org.team_id), &org.member.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0]["id"], done.as_str());
    assert_eq!(timeline[0]["status"], "completed");
    assert_eq!(timeline[1]["id"], halfway.as_str());
    assert_eq!(timeline[1]["progress"], 50.0);
    assert_eq!(timeline[1]["milestones_total"], 0);
}

#[tokio::test]
async fn audit_log_is_paginated_and_filterable() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    for title in ["One", "Two", "Three"] {
        app.create_objective(&org.team_id, &org.admin.token, title).await;
    }
    let path = format!("/api/organizations/{}/audit-logs", org.organization_id);

    let page: Value = app
        .auth_get(&format!("{}?action=objective.created&per_page=2", path), &org.admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["total"], 3);
    assert_eq!(page["total_pages"], 2);
    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["actor_id"], org.admin.id.as_str());
    assert_eq!(items[0]["actor_type"], "user");
    assert_eq!(items[0]["changes"][0]["field"], "title");
    assert_eq!(items[0]["changes"][0]["new_value"], "Three");

    let accepted: Value = app
        .auth_get(&format!("{}?action=invitation.accepted", path), &org.admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(accepted["total"], 1);
    assert_eq!(accepted["items"][0]["actor_id"], org.member.id.as_str());

    let resp = app.auth_get(&path, &org.member.token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn super_admin_reads_every_audit_log() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;
    let globex = app.seed_organization("globex").await;

    let resp = app
        .auth_get("/api/admin/audit-logs", &acme.admin.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let root = app.sign_in_super_admin().await;
    let page: Value = app
        .auth_get("/api/admin/audit-logs?action=team.created", &root.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["total"], 2);
    let orgs: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["organization_id"].as_str().unwrap())
        .collect();
    assert!(orgs.contains(&acme.organization_id.as_str()));
    assert!(orgs.contains(&globex.organization_id.as_str()));
}
