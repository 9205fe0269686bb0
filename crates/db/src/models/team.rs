use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::role::TeamRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: ObjectId,
    pub name: String,
    pub description: Option<String>,
    pub leader_id: ObjectId,
    #[serde(default)]
    pub members: Vec<TeamMember>,
    pub created_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamMember {
    pub user_id: ObjectId,
    pub role: TeamRole,
    pub email: String,
    pub name: String,
    pub joined_at: DateTime,
}

impl Team {
    pub const COLLECTION: &'static str = "teams";

    /// Team-scoped role of `user_id`. `None` means the user has no access to this team.
    pub fn get_user_role(&self, user_id: ObjectId) -> Option<TeamRole> {
        self.members
            .iter()
            .find(|m| m.user_id == user_id)
            .map(|m| m.role)
    }

    pub fn is_member(&self, user_id: ObjectId) -> bool {
        self.get_user_role(user_id).is_some()
    }

    pub fn has_member_email(&self, email: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.email.eq_ignore_ascii_case(email))
    }
}
