use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::Database;
use okrhub_db::models::{
    Kpi, Milestone, ObjectiveDependency, OperationalKeyResult, ProgressStatus,
    StrategicObjective,
};
use tracing::debug;

use super::base::{BaseDao, DaoError, DaoResult};
use crate::progress;

#[derive(Debug, Clone)]
pub struct NewObjective {
    pub organization_id: ObjectId,
    pub team_id: ObjectId,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: ObjectId,
    pub start_date: DateTime,
    pub end_date: DateTime,
    pub template_id: Option<ObjectId>,
}

#[derive(Debug, Default, Clone)]
pub struct ObjectiveUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub owner_id: Option<ObjectId>,
    pub start_date: Option<DateTime>,
    pub end_date: Option<DateTime>,
}

pub struct ObjectiveDao {
    pub base: BaseDao<StrategicObjective>,
    pub key_results: BaseDao<OperationalKeyResult>,
    pub kpis: BaseDao<Kpi>,
    pub dependencies: BaseDao<ObjectiveDependency>,
}

impl ObjectiveDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, StrategicObjective::COLLECTION),
            key_results: BaseDao::new(db, OperationalKeyResult::COLLECTION),
            kpis: BaseDao::new(db, Kpi::COLLECTION),
            dependencies: BaseDao::new(db, ObjectiveDependency::COLLECTION),
        }
    }

    pub async fn create(&self, new: NewObjective, created_by: ObjectId) -> DaoResult<StrategicObjective> {
        validate_range(new.start_date, new.end_date)?;
        let now = DateTime::now();
        let objective = StrategicObjective {
            id: None,
            organization_id: new.organization_id,
            team_id: new.team_id,
            title: new.title.trim().to_string(),
            description: new.description,
            owner_id: new.owner_id,
            start_date: new.start_date,
            end_date: new.end_date,
            milestones: Vec::new(),
            progress: 0.0,
            status: ProgressStatus::NotStarted,
            template_id: new.template_id,
            created_by,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = self.base.insert_one(&objective).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find(&self, id: ObjectId) -> DaoResult<StrategicObjective> {
        self.base.find_live(id).await
    }

    pub async fn list_for_team(&self, team_id: ObjectId) -> DaoResult<Vec<StrategicObjective>> {
        self.base
            .find_many(
                doc! { "team_id": team_id, "deleted_at": null },
                Some(doc! { "start_date": 1, "created_at": 1 }),
            )
            .await
    }

    pub async fn list_for_organization(
        &self,
        organization_id: ObjectId,
    ) -> DaoResult<Vec<StrategicObjective>> {
        self.base
            .find_many(
                doc! { "organization_id": organization_id, "deleted_at": null },
                Some(doc! { "start_date": 1 }),
            )
            .await
    }

    pub async fn update(&self, id: ObjectId, update: ObjectiveUpdate) -> DaoResult<StrategicObjective> {
        let current = self.find(id).await?;
        validate_range(
            update.start_date.unwrap_or(current.start_date),
            update.end_date.unwrap_or(current.end_date),
        )?;

        let mut set = Document::new();
        if let Some(title) = update.title {
            set.insert("title", title.trim());
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(owner_id) = update.owner_id {
            set.insert("owner_id", owner_id);
        }
        if let Some(start) = update.start_date {
            set.insert("start_date", start);
        }
        if let Some(end) = update.end_date {
            set.insert("end_date", end);
        }
        if !set.is_empty() {
            self.base.update_by_id(id, doc! { "$set": set }).await?;
        }
        self.find(id).await
    }

    /// Soft-deletes the objective together with its key results and KPIs.
    /// Dependency edges touching it are removed outright.
    pub async fn delete(&self, id: ObjectId) -> DaoResult<bool> {
        let now = DateTime::now();
        let deleted = self.base.soft_delete(id).await?;
        if deleted {
            self.key_results
                .update_many(
                    doc! { "objective_id": id, "deleted_at": null },
                    doc! { "$set": { "deleted_at": now } },
                )
                .await?;
            self.kpis
                .update_many(
                    doc! { "objective_id": id, "deleted_at": null },
                    doc! { "$set": { "deleted_at": now } },
                )
                .await?;
            let edges = self
                .dependencies
                .hard_delete(doc! { "$or": [{ "source": id }, { "target": id }] })
                .await?;
            debug!(?id, edges, "Removed dependency edges of deleted objective");
        }
        Ok(deleted)
    }

    pub async fn add_milestone(
        &self,
        id: ObjectId,
        title: &str,
        weight: f64,
        due_date: Option<DateTime>,
    ) -> DaoResult<StrategicObjective> {
        if !(weight.is_finite() && weight > 0.0) {
            return Err(DaoError::Validation("Milestone weight must be positive".to_string()));
        }
        let milestone = Milestone {
            id: nanoid::nanoid!(12),
            title: title.trim().to_string(),
            weight,
            completed: false,
            due_date,
            completed_at: None,
        };
        let pushed = self
            .base
            .update_one(
                doc! { "_id": id, "deleted_at": null },
                doc! { "$push": { "milestones": bson::to_bson(&milestone)? } },
            )
            .await?;
        if !pushed {
            return Err(DaoError::NotFound);
        }
        self.recompute_progress(id).await
    }

    pub async fn set_milestone_completed(
        &self,
        id: ObjectId,
        milestone_id: &str,
        completed: bool,
    ) -> DaoResult<StrategicObjective> {
        let completed_at = completed.then(DateTime::now);
        let matched = self
            .base
            .find_one_and_update(
                doc! { "_id": id, "deleted_at": null, "milestones.id": milestone_id },
                doc! {
                    "$set": {
                        "milestones.$.completed": completed,
                        "milestones.$.completed_at": completed_at,
                    }
                },
            )
            .await?;
        if matched.is_none() {
            return Err(DaoError::NotFound);
        }
        self.recompute_progress(id).await
    }

    /// Re-derives and stores `progress`/`status` from milestones or key results.
    pub async fn recompute_progress(&self, id: ObjectId) -> DaoResult<StrategicObjective> {
        let objective = self.find(id).await?;
        let key_results = self
            .key_results
            .find_many(doc! { "objective_id": id, "deleted_at": null }, None)
            .await?;
        let child_progress: Vec<f64> = key_results.iter().map(|kr| kr.progress).collect();

        let value = progress::objective_progress(&objective.milestones, &child_progress);
        let status = progress::status_for(value);
        debug!(?id, progress = value, status = status.as_str(), "Objective progress");

        self.base
            .update_by_id(
                id,
                doc! { "$set": { "progress": value, "status": status.as_str() } },
            )
            .await?;
        self.find(id).await
    }
}

pub(crate) fn validate_range(start: DateTime, end: DateTime) -> DaoResult<()> {
    if end < start {
        return Err(DaoError::Validation(
            "End date must not be before start date".to_string(),
        ));
    }
    Ok(())
}
