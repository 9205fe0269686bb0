use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use okrhub_db::models::{Kpi, KpiFrequency, KpiReading, OperationalKeyResult};
use tracing::debug;

use super::base::{BaseDao, DaoError, DaoResult};
use crate::progress;

/// Readings kept per KPI; older entries are trimmed by `$slice`.
const HISTORY_LIMIT: i32 = 365;

#[derive(Debug, Clone)]
pub struct NewKpi {
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub frequency: KpiFrequency,
    pub current_value: f64,
    pub target_value: f64,
}

#[derive(Debug, Default, Clone)]
pub struct KpiUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub frequency: Option<KpiFrequency>,
    pub target_value: Option<f64>,
}

pub struct KpiDao {
    pub base: BaseDao<Kpi>,
}

impl KpiDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Kpi::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        key_result: &OperationalKeyResult,
        new: NewKpi,
        created_by: ObjectId,
    ) -> DaoResult<Kpi> {
        let key_result_id = key_result.id.ok_or(DaoError::NotFound)?;
        let value = progress::kpi_progress(new.current_value, new.target_value);
        let now = DateTime::now();
        let kpi = Kpi {
            id: None,
            organization_id: key_result.organization_id,
            team_id: key_result.team_id,
            objective_id: key_result.objective_id,
            key_result_id,
            name: new.name.trim().to_string(),
            description: new.description,
            unit: new.unit,
            frequency: new.frequency,
            current_value: new.current_value,
            target_value: new.target_value,
            progress: value,
            status: progress::status_for(value),
            history: vec![KpiReading {
                value: new.current_value,
                recorded_at: now,
                recorded_by: created_by,
            }],
            created_by,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = self.base.insert_one(&kpi).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find(&self, id: ObjectId) -> DaoResult<Kpi> {
        self.base.find_live(id).await
    }

    pub async fn list_for_key_result(&self, key_result_id: ObjectId) -> DaoResult<Vec<Kpi>> {
        self.base
            .find_many(
                doc! { "key_result_id": key_result_id, "deleted_at": null },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }

    pub async fn list_for_team(&self, team_id: ObjectId) -> DaoResult<Vec<Kpi>> {
        self.base
            .find_many(doc! { "team_id": team_id, "deleted_at": null }, None)
            .await
    }

    pub async fn update(&self, id: ObjectId, update: KpiUpdate) -> DaoResult<Kpi> {
        let current = self.find(id).await?;
        let target = update.target_value.unwrap_or(current.target_value);
        let computed = progress::kpi_progress(current.current_value, target);

        let mut set = doc! {
            "target_value": target,
            "progress": computed,
            "status": progress::status_for(computed).as_str(),
        };
        if let Some(name) = update.name {
            set.insert("name", name.trim());
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(unit) = update.unit {
            set.insert("unit", unit);
        }
        if let Some(frequency) = update.frequency {
            set.insert("frequency", bson::to_bson(&frequency)?);
        }

        self.base.update_by_id(id, doc! { "$set": set }).await?;
        self.find(id).await
    }

    /// Records a new reading; progress is recomputed against the stored target.
    pub async fn update_value(
        &self,
        id: ObjectId,
        current_value: f64,
        recorded_by: ObjectId,
    ) -> DaoResult<Kpi> {
        if !current_value.is_finite() {
            return Err(DaoError::Validation("KPI value must be a finite number".to_string()));
        }
        let kpi = self.find(id).await?;
        let computed = progress::kpi_progress(current_value, kpi.target_value);
        let reading = KpiReading {
            value: current_value,
            recorded_at: DateTime::now(),
            recorded_by,
        };

        self.base
            .update_by_id(
                id,
                doc! {
                    "$set": {
                        "current_value": current_value,
                        "progress": computed,
                        "status": progress::status_for(computed).as_str(),
                    },
                    "$push": {
                        "history": {
                            "$each": [bson::to_bson(&reading)?],
                            "$slice": -HISTORY_LIMIT,
                        }
                    },
                },
            )
            .await?;
        debug!(?id, current_value, progress = computed, "KPI value updated");
        self.find(id).await
    }

    pub async fn delete(&self, id: ObjectId) -> DaoResult<bool> {
        self.base.soft_delete(id).await
    }
}
