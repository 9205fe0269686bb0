use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::role::TeamRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: ObjectId,
    pub team_id: ObjectId,
    pub email: String,
    pub name: String,
    pub role: TeamRole,
    pub token: String,
    #[serde(default)]
    pub status: InvitationStatus,
    pub expires_at: DateTime,
    pub invited_by: ObjectId,
    pub accepted_at: Option<DateTime>,
    pub accepted_by: Option<ObjectId>,
    pub bounced_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Expired,
    Bounced,
}

impl InvitationStatus {
    pub fn is_terminal(self) -> bool {
        self != InvitationStatus::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Expired => "expired",
            InvitationStatus::Bounced => "bounced",
        }
    }
}

impl Invitation {
    pub const COLLECTION: &'static str = "invitations";

    pub fn is_past_due(&self, now: DateTime) -> bool {
        now >= self.expires_at
    }

    /// Status as observed at `now`; an overdue pending row reads as expired
    /// whether or not the transition has been persisted yet.
    pub fn effective_status(&self, now: DateTime) -> InvitationStatus {
        match self.status {
            InvitationStatus::Pending if self.is_past_due(now) => InvitationStatus::Expired,
            status => status,
        }
    }
}
