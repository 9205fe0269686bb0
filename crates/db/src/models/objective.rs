use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategicObjective {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: ObjectId,
    pub team_id: ObjectId,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: ObjectId,
    pub start_date: DateTime,
    pub end_date: DateTime,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub status: ProgressStatus,
    pub template_id: Option<ObjectId>,
    pub created_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    pub weight: f64,
    #[serde(default)]
    pub completed: bool,
    pub due_date: Option<DateTime>,
    pub completed_at: Option<DateTime>,
}

/// Status bucket derived from a 0-100 progress value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    OffTrack,
    AtRisk,
    OnTrack,
    Completed,
}

impl ProgressStatus {
    pub const ALL: [ProgressStatus; 5] = [
        ProgressStatus::NotStarted,
        ProgressStatus::OffTrack,
        ProgressStatus::AtRisk,
        ProgressStatus::OnTrack,
        ProgressStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::OffTrack => "off_track",
            ProgressStatus::AtRisk => "at_risk",
            ProgressStatus::OnTrack => "on_track",
            ProgressStatus::Completed => "completed",
        }
    }
}

impl StrategicObjective {
    pub const COLLECTION: &'static str = "strategic_objectives";
}
