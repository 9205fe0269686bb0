use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::objective::ProgressStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpi {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: ObjectId,
    pub team_id: ObjectId,
    pub objective_id: ObjectId,
    pub key_result_id: ObjectId,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    #[serde(default)]
    pub frequency: KpiFrequency,
    #[serde(default)]
    pub current_value: f64,
    pub target_value: f64,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub status: ProgressStatus,
    #[serde(default)]
    pub history: Vec<KpiReading>,
    pub created_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KpiFrequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
    Quarterly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiReading {
    pub value: f64,
    pub recorded_at: DateTime,
    pub recorded_by: ObjectId,
}

impl Kpi {
    pub const COLLECTION: &'static str = "kpis";
}
