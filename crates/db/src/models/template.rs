use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::kpi::KpiFrequency;

/// Reusable objective blueprint. `organization_id == None` marks a global template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveTemplate {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: Option<ObjectId>,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    #[serde(default)]
    pub key_results: Vec<TemplateKeyResult>,
    pub created_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateKeyResult {
    pub title: String,
    #[serde(default)]
    pub start_value: f64,
    pub target_value: f64,
    pub unit: String,
    #[serde(default)]
    pub kpis: Vec<TemplateKpi>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateKpi {
    pub name: String,
    pub target_value: f64,
    pub unit: String,
    #[serde(default)]
    pub frequency: KpiFrequency,
}

impl ObjectiveTemplate {
    pub const COLLECTION: &'static str = "objective_templates";
}
