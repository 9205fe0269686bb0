use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use okrhub_db::models::{DependencyType, ObjectiveDependency, StrategicObjective};
use tracing::info;

use super::base::{BaseDao, DaoError, DaoResult};
use crate::graph;

pub struct DependencyDao {
    pub base: BaseDao<ObjectiveDependency>,
    pub objectives: BaseDao<StrategicObjective>,
}

/// Edge in "must finish first -> waits" order: `a blocks b` and `b depends_on a`
/// both map to `(a, b)`.
fn ordering_edge(dependency: &ObjectiveDependency) -> Option<(ObjectId, ObjectId)> {
    match dependency.dependency_type {
        DependencyType::Blocks => Some((dependency.source, dependency.target)),
        DependencyType::DependsOn => Some((dependency.target, dependency.source)),
        DependencyType::RelatedTo => None,
    }
}

impl DependencyDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, ObjectiveDependency::COLLECTION),
            objectives: BaseDao::new(db, StrategicObjective::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        organization_id: ObjectId,
        source: ObjectId,
        target: ObjectId,
        dependency_type: DependencyType,
        created_by: ObjectId,
    ) -> DaoResult<ObjectiveDependency> {
        if source == target {
            return Err(DaoError::Validation(
                "An objective cannot depend on itself".to_string(),
            ));
        }

        let found = self
            .objectives
            .count(doc! {
                "_id": { "$in": [source, target] },
                "organization_id": organization_id,
                "deleted_at": null,
            })
            .await?;
        if found != 2 {
            return Err(DaoError::NotFound);
        }

        let duplicate = self
            .base
            .count(doc! {
                "source": source,
                "target": target,
                "dependency_type": bson::to_bson(&dependency_type)?,
            })
            .await?;
        if duplicate > 0 {
            return Err(DaoError::Conflict("Dependency already exists".to_string()));
        }

        let dependency = ObjectiveDependency {
            id: None,
            organization_id,
            source,
            target,
            dependency_type,
            created_by,
            created_at: DateTime::now(),
        };

        if let Some((from, to)) = ordering_edge(&dependency) {
            let edges: Vec<_> = self
                .list_for_organization(organization_id)
                .await?
                .iter()
                .filter_map(ordering_edge)
                .collect();
            if graph::would_create_cycle(&edges, from, to) {
                return Err(DaoError::Conflict(
                    "Dependency would create a cycle".to_string(),
                ));
            }
        }

        let id = self.base.insert_one(&dependency).await?;
        info!(?id, ?source, ?target, "Objective dependency created");
        self.base.find_by_id(id).await
    }

    pub async fn list_for_organization(
        &self,
        organization_id: ObjectId,
    ) -> DaoResult<Vec<ObjectiveDependency>> {
        self.base
            .find_many(
                doc! { "organization_id": organization_id },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }

    pub async fn delete(&self, organization_id: ObjectId, id: ObjectId) -> DaoResult<()> {
        let deleted = self
            .base
            .hard_delete(doc! { "_id": id, "organization_id": organization_id })
            .await?;
        if deleted == 0 {
            return Err(DaoError::NotFound);
        }
        Ok(())
    }
}
