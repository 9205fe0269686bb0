use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::role::Role;

/// Organization scope string reported for the super admin.
pub const SYSTEM_SCOPE: &str = "SYSTEM";

/// Prefix of external ids for accounts created before their owner signs in.
pub const PENDING_EXTERNAL_PREFIX: &str = "pending_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Subject id issued by the identity provider, or a `pending_` placeholder.
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// `None` for the super admin (system scope) and for accounts not yet in an organization.
    pub organization_id: Option<ObjectId>,
    pub last_sign_in_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl User {
    pub const COLLECTION: &'static str = "users";

    pub fn is_placeholder(&self) -> bool {
        self.external_id.starts_with(PENDING_EXTERNAL_PREFIX)
    }

    /// Organization id as rendered to clients: the hex id, `SYSTEM`, or nothing.
    pub fn organization_scope(&self) -> Option<String> {
        if self.role == Role::SuperAdmin {
            return Some(SYSTEM_SCOPE.to_string());
        }
        self.organization_id.map(|id| id.to_hex())
    }

    pub fn belongs_to(&self, organization_id: ObjectId) -> bool {
        self.organization_id == Some(organization_id)
    }
}
