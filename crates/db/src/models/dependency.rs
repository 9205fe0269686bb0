use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Directed edge between two strategic objectives of one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveDependency {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: ObjectId,
    pub source: ObjectId,
    pub target: ObjectId,
    pub dependency_type: DependencyType,
    pub created_by: ObjectId,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    Blocks,
    DependsOn,
    RelatedTo,
}

impl DependencyType {
    /// Ordering edges take part in cycle checks; `related_to` does not.
    pub fn is_ordering(self) -> bool {
        !matches!(self, DependencyType::RelatedTo)
    }
}

impl ObjectiveDependency {
    pub const COLLECTION: &'static str = "objective_dependencies";
}
