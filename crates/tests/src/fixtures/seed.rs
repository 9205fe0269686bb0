use jsonwebtoken::{EncodingKey, Header, encode};
use okrhub_services::{auth::Claims, webhook::WebhookVerifier};
use serde_json::{Value, json};

use super::test_app::{TEST_ISSUER, TEST_JWT_SECRET, TestApp, email_webhook_secret, identity_webhook_secret};

/// A synced account and the session token used to act as it.
pub struct SeededUser {
    pub id: String,
    pub external_id: String,
    pub email: String,
    pub token: String,
}

/// An organization with its admin, one team led by the admin, and a member
/// who joined that team through an invitation.
pub struct SeededOrganization {
    pub organization_id: String,
    pub name: String,
    pub admin: SeededUser,
    pub team_id: String,
    pub member: SeededUser,
}

/// Mints a session token the way the identity provider would.
pub fn identity_token(sub: &str, email: &str, name: &str) -> String {
    sign_claims(sub, Some(email), name)
}

/// A session token whose identity carries no email claim.
pub fn identity_token_without_email(sub: &str, name: &str) -> String {
    sign_claims(sub, None, name)
}

fn sign_claims(sub: &str, email: Option<&str>, name: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        email: email.map(str::to_string),
        name: Some(name.to_string()),
        image_url: None,
        iat: now,
        exp: now + 3600,
        iss: TEST_ISSUER.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign identity token")
}

fn signed_headers(secret: &str, body: &str) -> Vec<(&'static str, String)> {
    let verifier = WebhookVerifier::new(secret).unwrap();
    let id = format!("msg_{}", uuid::Uuid::new_v4().simple());
    let timestamp = chrono::Utc::now().timestamp();
    let signature = verifier.sign(&id, timestamp, body.as_bytes()).unwrap();
    vec![
        ("svix-id", id),
        ("svix-timestamp", timestamp.to_string()),
        ("svix-signature", signature),
    ]
}

impl TestApp {
    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_put(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_delete(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    /// Signs in through `/api/auth/sync` and returns the local account.
    pub async fn sign_in(&self, sub: &str, email: &str, name: &str) -> SeededUser {
        let token = identity_token(sub, email, name);
        let resp = self
            .auth_post("/api/auth/sync", &token)
            .json(&json!({}))
            .send()
            .await
            .expect("Sync request failed");
        assert_eq!(
            resp.status().as_u16(),
            200,
            "Sync failed: {}",
            resp.text().await.unwrap_or_default()
        );
        let json: Value = resp.json().await.unwrap();

        SeededUser {
            id: json["id"].as_str().unwrap().to_string(),
            external_id: sub.to_string(),
            email: email.to_string(),
            token,
        }
    }

    pub async fn sign_in_super_admin(&self) -> SeededUser {
        self.sign_in("user_root", super::test_app::SUPER_ADMIN_EMAIL, "Root")
            .await
    }

    /// Self-service signup: a fresh account creates `name` and becomes its admin.
    pub async fn create_organization(&self, name: &str, admin_email: &str) -> (String, SeededUser) {
        let sub = format!("user_{}", uuid::Uuid::new_v4().simple());
        let admin = self.sign_in(&sub, admin_email, "Org Admin").await;
        let resp = self
            .auth_post("/api/organizations", &admin.token)
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.status().as_u16(),
            201,
            "Create organization failed: {}",
            resp.text().await.unwrap_or_default()
        );
        let org: Value = resp.json().await.unwrap();
        (org["id"].as_str().unwrap().to_string(), admin)
    }

    pub async fn create_team(&self, organization_id: &str, token: &str, name: &str) -> String {
        let resp = self
            .auth_post(&format!("/api/organizations/{}/teams", organization_id), token)
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.status().as_u16(),
            201,
            "Create team failed: {}",
            resp.text().await.unwrap_or_default()
        );
        let team: Value = resp.json().await.unwrap();
        team["id"].as_str().unwrap().to_string()
    }

    /// Creates an invitation and returns the response body (includes the token).
    pub async fn invite(&self, team_id: &str, token: &str, email: &str, role: &str) -> Value {
        let resp = self
            .auth_post(&format!("/api/teams/{}/invitations", team_id), token)
            .json(&json!({ "email": email, "name": "Invitee", "role": role }))
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.status().as_u16(),
            201,
            "Create invitation failed: {}",
            resp.text().await.unwrap_or_default()
        );
        resp.json().await.unwrap()
    }

    /// Signs in `email` and accepts an invitation to `team_id`.
    pub async fn join_team(
        &self,
        team_id: &str,
        inviter_token: &str,
        email: &str,
        role: &str,
    ) -> SeededUser {
        let invitation = self.invite(team_id, inviter_token, email, role).await;
        let sub = format!("user_{}", uuid::Uuid::new_v4().simple());
        let user = self.sign_in(&sub, email, "Team Member").await;
        let resp = self
            .auth_post(
                &format!("/api/invitations/{}/accept", invitation["token"].as_str().unwrap()),
                &user.token,
            )
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.status().as_u16(),
            200,
            "Accept invitation failed: {}",
            resp.text().await.unwrap_or_default()
        );
        user
    }

    pub async fn seed_organization(&self, slug: &str) -> SeededOrganization {
        let name = format!("{} Corp", slug);
        let (organization_id, admin) = self
            .create_organization(&name, &format!("admin@{}.test", slug))
            .await;
        let team_id = self.create_team(&organization_id, &admin.token, "Growth").await;
        let member = self
            .join_team(&team_id, &admin.token, &format!("member@{}.test", slug), "member")
            .await;

        SeededOrganization {
            organization_id,
            name,
            admin,
            team_id,
            member,
        }
    }

    /// Creates an objective in `team_id` and returns its id.
    pub async fn create_objective(&self, team_id: &str, token: &str, title: &str) -> String {
        let resp = self
            .auth_post(&format!("/api/teams/{}/objectives", team_id), token)
            .json(&json!({
                "title": title,
                "start_date": "2026-01-01",
                "end_date": "2026-03-31",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.status().as_u16(),
            201,
            "Create objective failed: {}",
            resp.text().await.unwrap_or_default()
        );
        let json: Value = resp.json().await.unwrap();
        json["id"].as_str().unwrap().to_string()
    }

    pub fn identity_webhook(&self, body: &Value) -> reqwest::RequestBuilder {
        self.signed_post("/api/clerk-webhooks", &identity_webhook_secret(), body)
    }

    pub fn email_webhook(&self, body: &Value) -> reqwest::RequestBuilder {
        self.signed_post("/api/webhooks/email", &email_webhook_secret(), body)
    }

    fn signed_post(&self, path: &str, secret: &str, body: &Value) -> reqwest::RequestBuilder {
        let payload = body.to_string();
        let mut request = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json");
        for (name, value) in signed_headers(secret, &payload) {
            request = request.header(name, value);
        }
        request.body(payload)
    }
}
