use crate::fixtures::test_app::TestApp;
use serde_json::{Value, json};

fn sales_template(global: bool) -> Value {
    json!({
        "name": "Grow pipeline",
        "description": "Quarterly sales push",
        "category": "Sales",
        "global": global,
        "key_results": [
            {
                "title": "Close deals",
                "start_value": 10.0,
                "target_value": 50.0,
                "unit": "deals",
                "kpis": [
                    { "name": "Demos booked", "target_value": 40.0, "unit": "demos" },
                    { "name": "Win rate", "target_value": 30.0, "unit": "%", "frequency": "monthly" }
                ]
            },
            { "title": "Expand accounts", "target_value": 5.0, "unit": "accounts" }
        ]
    })
}

impl TestApp {
    async fn create_template(&self, token: &str, body: &Value) -> Value {
        let resp = self
            .auth_post("/api/templates", token)
            .json(body)
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.status().as_u16(),
            201,
            "Create template failed: {}",
            resp.text().await.unwrap_or_default()
        );
        resp.json().await.unwrap()
    }

    async fn list_templates(&self, token: &str, query: &str) -> Vec<Value> {
        self.auth_get(&format!("/api/templates{}", query), token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn organization_templates_stay_private() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;
    let globex = app.seed_organization("globex").await;

    let template = app.create_template(&acme.admin.token, &sales_template(false)).await;
    assert_eq!(template["global"], false);
    assert_eq!(template["category"], "sales");
    assert_eq!(template["organization_id"], acme.organization_id.as_str());

    assert_eq!(app.list_templates(&acme.member.token, "").await.len(), 1);
    assert!(app.list_templates(&globex.admin.token, "").await.is_empty());

    let resp = app
        .auth_post("/api/templates", &acme.member.token)
        .json(&sales_template(false))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn global_templates_need_super_admin() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;
    let globex = app.seed_organization("globex").await;

    let resp = app
        .auth_post("/api/templates", &acme.admin.token)
        .json(&sales_template(true))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let root = app.sign_in_super_admin().await;
    let template = app.create_template(&root.token, &sales_template(true)).await;
    assert_eq!(template["global"], true);
    assert!(template["organization_id"].is_null());

    assert_eq!(app.list_templates(&acme.member.token, "").await.len(), 1);
    assert_eq!(app.list_templates(&globex.admin.token, "").await.len(), 1);

    let path = format!("/api/templates/{}", template["id"].as_str().unwrap());
    let resp = app.auth_delete(&path, &acme.admin.token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 403);
    let resp = app.auth_delete(&path, &root.token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 204);
    assert!(app.list_templates(&acme.admin.token, "").await.is_empty());
}

#[tokio::test]
async fn templates_filter_by_category() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    app.create_template(&org.admin.token, &sales_template(false)).await;
    let mut hiring = sales_template(false);
    hiring["name"] = json!("Hire engineers");
    hiring["category"] = json!("people");
    app.create_template(&org.admin.token, &hiring).await;

    assert_eq!(app.list_templates(&org.admin.token, "").await.len(), 2);
    let people = app.list_templates(&org.admin.token, "?category=People").await;
    assert_eq!(people.len(), 1);
    assert_eq!(people[0]["name"], "Hire engineers");
}

#[tokio::test]
async fn applying_template_builds_objective_tree() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    let template = app.create_template(&org.admin.token, &sales_template(false)).await;

    let resp = app
        .auth_post(
            &format!("/api/templates/{}/apply", template["id"].as_str().unwrap()),
            &org.admin.token,
        )
        .json(&json!({
            "team_id": org.team_id,
            "start_date": "2026-04-01",
            "end_date": "2026-06-30",
            "owner_id": org.member.id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let applied: Value = resp.json().await.unwrap();
    assert_eq!(applied["key_results"], 2);
    assert_eq!(applied["kpis"], 2);
    let objective = &applied["objective"];
    assert_eq!(objective["title"], "Grow pipeline");
    assert_eq!(objective["template_id"], template["id"]);
    assert_eq!(objective["owner_id"], org.member.id.as_str());
    assert_eq!(objective["progress"], 0.0);
    assert_eq!(objective["status"], "not_started");

    let objective_id = objective["id"].as_str().unwrap();
    let key_results: Vec<Value> = app
        .auth_get(&format!("/api/objectives/{}/key-results", objective_id), &org.member.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(key_results.len(), 2);
    let deals = key_results.iter().find(|kr| kr["title"] == "Close deals").unwrap();
    assert_eq!(deals["current_value"], 10.0);
    assert_eq!(deals["start_date"], "2026-04-01T00:00:00+00:00");

    let kpis: Vec<Value> = app
        .auth_get(
            &format!("/api/key-results/{}/kpis", deals["id"].as_str().unwrap()),
            &org.member.token,
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(kpis.len(), 2);
    assert!(kpis.iter().any(|k| k["name"] == "Win rate" && k["frequency"] == "monthly"));
}

#[tokio::test]
async fn foreign_templates_cannot_be_applied() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;
    let globex = app.seed_organization("globex").await;
    let template = app.create_template(&globex.admin.token, &sales_template(false)).await;

    let resp = app
        .auth_post(
            &format!("/api/templates/{}/apply", template["id"].as_str().unwrap()),
            &acme.admin.token,
        )
        .json(&json!({
            "team_id": acme.team_id,
            "start_date": "2026-04-01",
            "end_date": "2026-06-30",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
