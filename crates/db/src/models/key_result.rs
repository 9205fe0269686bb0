use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::objective::ProgressStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalKeyResult {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: ObjectId,
    pub team_id: ObjectId,
    pub objective_id: ObjectId,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: ObjectId,
    #[serde(default)]
    pub start_value: f64,
    #[serde(default)]
    pub current_value: f64,
    pub target_value: f64,
    pub unit: String,
    pub start_date: DateTime,
    pub end_date: DateTime,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub status: ProgressStatus,
    pub created_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

impl OperationalKeyResult {
    pub const COLLECTION: &'static str = "operational_key_results";
}
