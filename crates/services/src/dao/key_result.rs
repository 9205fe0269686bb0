use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use okrhub_db::models::{Kpi, OperationalKeyResult, StrategicObjective};

use super::base::{BaseDao, DaoError, DaoResult};
use super::objective::validate_range;
use crate::progress;

#[derive(Debug, Clone)]
pub struct NewKeyResult {
    pub title: String,
    pub description: Option<String>,
    pub owner_id: ObjectId,
    pub start_value: f64,
    pub current_value: f64,
    pub target_value: f64,
    pub unit: String,
    pub start_date: Option<DateTime>,
    pub end_date: Option<DateTime>,
}

#[derive(Debug, Default, Clone)]
pub struct KeyResultUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub owner_id: Option<ObjectId>,
    pub start_value: Option<f64>,
    pub current_value: Option<f64>,
    pub target_value: Option<f64>,
    pub unit: Option<String>,
}

pub struct KeyResultDao {
    pub base: BaseDao<OperationalKeyResult>,
    pub kpis: BaseDao<Kpi>,
}

impl KeyResultDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, OperationalKeyResult::COLLECTION),
            kpis: BaseDao::new(db, Kpi::COLLECTION),
        }
    }

    /// Creates a key result under `objective`; dates default to the objective's range.
    pub async fn create(
        &self,
        objective: &StrategicObjective,
        new: NewKeyResult,
        created_by: ObjectId,
    ) -> DaoResult<OperationalKeyResult> {
        let objective_id = objective.id.ok_or(DaoError::NotFound)?;
        let start_date = new.start_date.unwrap_or(objective.start_date);
        let end_date = new.end_date.unwrap_or(objective.end_date);
        validate_range(start_date, end_date)?;

        let value = progress::key_result_progress(new.start_value, new.current_value, new.target_value);
        let now = DateTime::now();
        let key_result = OperationalKeyResult {
            id: None,
            organization_id: objective.organization_id,
            team_id: objective.team_id,
            objective_id,
            title: new.title.trim().to_string(),
            description: new.description,
            owner_id: new.owner_id,
            start_value: new.start_value,
            current_value: new.current_value,
            target_value: new.target_value,
            unit: new.unit,
            start_date,
            end_date,
            progress: value,
            status: progress::status_for(value),
            created_by,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = self.base.insert_one(&key_result).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find(&self, id: ObjectId) -> DaoResult<OperationalKeyResult> {
        self.base.find_live(id).await
    }

    pub async fn list_for_objective(&self, objective_id: ObjectId) -> DaoResult<Vec<OperationalKeyResult>> {
        self.base
            .find_many(
                doc! { "objective_id": objective_id, "deleted_at": null },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }

    pub async fn list_for_team(&self, team_id: ObjectId) -> DaoResult<Vec<OperationalKeyResult>> {
        self.base
            .find_many(doc! { "team_id": team_id, "deleted_at": null }, None)
            .await
    }

    /// Applies the update and re-derives progress from the resulting values.
    pub async fn update(&self, id: ObjectId, update: KeyResultUpdate) -> DaoResult<OperationalKeyResult> {
        let current = self.find(id).await?;
        let start = update.start_value.unwrap_or(current.start_value);
        let value = update.current_value.unwrap_or(current.current_value);
        let target = update.target_value.unwrap_or(current.target_value);
        let computed = progress::key_result_progress(start, value, target);

        let mut set = doc! {
            "start_value": start,
            "current_value": value,
            "target_value": target,
            "progress": computed,
            "status": progress::status_for(computed).as_str(),
        };
        if let Some(title) = update.title {
            set.insert("title", title.trim());
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(owner_id) = update.owner_id {
            set.insert("owner_id", owner_id);
        }
        if let Some(unit) = update.unit {
            set.insert("unit", unit);
        }

        self.base.update_by_id(id, doc! { "$set": set }).await?;
        self.find(id).await
    }

    /// Soft-deletes the key result and its KPIs. Returns the parent objective id.
    pub async fn delete(&self, id: ObjectId) -> DaoResult<ObjectId> {
        let key_result = self.find(id).await?;
        self.base.soft_delete(id).await?;
        self.kpis
            .update_many(
                doc! { "key_result_id": id, "deleted_at": null },
                doc! { "$set": { "deleted_at": DateTime::now() } },
            )
            .await?;
        Ok(key_result.objective_id)
    }
}
