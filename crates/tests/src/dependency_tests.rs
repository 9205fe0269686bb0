use crate::fixtures::{seed::SeededOrganization, test_app::TestApp};
use serde_json::{Value, json};

impl TestApp {
    fn link(
        &self,
        org: &SeededOrganization,
        source: &str,
        target: &str,
        dependency_type: &str,
    ) -> reqwest::RequestBuilder {
        self.auth_post(
            &format!("/api/organizations/{}/dependencies", org.organization_id),
            &org.admin.token,
        )
        .json(&json!({
            "source": source,
            "target": target,
            "dependency_type": dependency_type,
        }))
    }
}

async fn three_objectives(app: &TestApp, org: &SeededOrganization) -> (String, String, String) {
    let a = app.create_objective(&org.team_id, &org.admin.token, "A").await;
    let b = app.create_objective(&org.team_id, &org.admin.token, "B").await;
    let c = app.create_objective(&org.team_id, &org.admin.token, "C").await;
    (a, b, c)
}

#[tokio::test]
async fn blocking_cycle_is_rejected() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    let (a, b, c) = three_objectives(&app, &org).await;

    let resp = app.link(&org, &a, &b, "blocks").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let resp = app.link(&org, &b, &c, "blocks").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app.link(&org, &c, &a, "blocks").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // A depends_on C would order C before A.
    let resp = app.link(&org, &a, &c, "depends_on").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    let resp = app.link(&org, &c, &a, "depends_on").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn related_links_skip_cycle_check() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    let (a, b, _) = three_objectives(&app, &org).await;

    let resp = app.link(&org, &a, &b, "blocks").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let resp = app.link(&org, &b, &a, "related_to").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn invalid_links_are_rejected() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    let (a, b, _) = three_objectives(&app, &org).await;

    let resp = app.link(&org, &a, &a, "related_to").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let resp = app.link(&org, &a, &b, "blocks").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let resp = app.link(&org, &a, &b, "blocks").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    let other = app.seed_organization("globex").await;
    let foreign = app
        .create_objective(&other.team_id, &other.admin.token, "Foreign")
        .await;
    let resp = app.link(&org, &a, &foreign, "blocks").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = app
        .auth_post(
            &format!("/api/organizations/{}/dependencies", org.organization_id),
            &org.member.token,
        )
        .json(&json!({ "source": b, "target": a, "dependency_type": "related_to" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn graph_lists_nodes_and_edges() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    let (a, b, c) = three_objectives(&app, &org).await;
    let edge: Value = app
        .link(&org, &a, &b, "blocks")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    app.link(&org, &b, &c, "related_to").send().await.unwrap();
    let path = format!("/api/organizations/{}/dependencies", org.organization_id);

    let graph: Value = app
        .auth_get(&path, &org.member.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 3);
    let edges = graph["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 2);
    assert!(edges.iter().any(|e| e["source"] == a.as_str()
        && e["target"] == b.as_str()
        && e["dependency_type"] == "blocks"));

    let resp = app
        .auth_delete(
            &format!("/api/dependencies/{}", edge["id"].as_str().unwrap()),
            &org.admin.token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let graph: Value = app
        .auth_get(&path, &org.admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(graph["edges"].as_array().unwrap().len(), 1);

    let outsider = app.seed_organization("globex").await;
    let resp = app.auth_get(&path, &outsider.admin.token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn deleting_an_objective_drops_its_links() {
    let app = TestApp::spawn().await;
    let org = app.seed_organization("acme").await;
    let (a, b, c) = three_objectives(&app, &org).await;

    let resp = app.link(&org, &a, &b, "blocks").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let resp = app.link(&org, &b, &c, "blocks").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app
        .auth_delete(&format!("/api/objectives/{}", b), &org.admin.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    // The path through B is gone, so C may now block A.
    let resp = app.link(&org, &c, &a, "blocks").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let graph: Value = app
        .auth_get(
            &format!("/api/organizations/{}/dependencies", org.organization_id),
            &org.admin.token,
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let nodes = graph["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert!(nodes.iter().all(|n| n["id"] != b.as_str()));
    let edges = graph["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert!(edges
        .iter()
        .all(|e| e["source"] != b.as_str() && e["target"] != b.as_str()));
}
