use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: Option<ObjectId>,
    pub actor_id: Option<ObjectId>,
    #[serde(default)]
    pub actor_type: ActorType,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<ObjectId>,
    #[serde(default)]
    pub changes: Vec<AuditChange>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    #[default]
    User,
    System,
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditChange {
    pub field: String,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
}

impl AuditChange {
    pub fn set(field: &str, new_value: serde_json::Value) -> Self {
        Self {
            field: field.to_string(),
            old_value: None,
            new_value: Some(new_value),
        }
    }

    pub fn diff(field: &str, old_value: serde_json::Value, new_value: serde_json::Value) -> Self {
        Self {
            field: field.to_string(),
            old_value: Some(old_value),
            new_value: Some(new_value),
        }
    }
}

impl AuditLog {
    pub const COLLECTION: &'static str = "audit_logs";
}
