use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use okrhub_db::models::{ObjectiveTemplate, TemplateKeyResult};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct TemplateDao {
    pub base: BaseDao<ObjectiveTemplate>,
}

impl TemplateDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, ObjectiveTemplate::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        organization_id: Option<ObjectId>,
        name: &str,
        description: Option<String>,
        category: &str,
        key_results: Vec<TemplateKeyResult>,
        created_by: ObjectId,
    ) -> DaoResult<ObjectiveTemplate> {
        if key_results.iter().any(|kr| kr.title.trim().is_empty()) {
            return Err(DaoError::Validation(
                "Template key results need a title".to_string(),
            ));
        }
        let now = DateTime::now();
        let template = ObjectiveTemplate {
            id: None,
            organization_id,
            name: name.trim().to_string(),
            description,
            category: category.trim().to_lowercase(),
            key_results,
            created_by,
            created_at: now,
            updated_at: now,
        };
        let id = self.base.insert_one(&template).await?;
        self.base.find_by_id(id).await
    }

    /// Global templates plus those owned by `organization_id`.
    pub async fn list_visible(
        &self,
        organization_id: Option<ObjectId>,
        category: Option<&str>,
    ) -> DaoResult<Vec<ObjectiveTemplate>> {
        let mut scopes = vec![bson::Bson::Null];
        if let Some(org) = organization_id {
            scopes.push(org.into());
        }
        let mut filter = doc! { "organization_id": { "$in": scopes } };
        if let Some(category) = category {
            filter.insert("category", category.to_lowercase());
        }
        self.base
            .find_many(filter, Some(doc! { "category": 1, "name": 1 }))
            .await
    }

    /// Fetches a template visible to `organization_id`.
    pub async fn find_visible(
        &self,
        id: ObjectId,
        organization_id: Option<ObjectId>,
    ) -> DaoResult<ObjectiveTemplate> {
        let template = self.base.find_by_id(id).await?;
        match template.organization_id {
            None => Ok(template),
            Some(owner) if Some(owner) == organization_id => Ok(template),
            Some(_) => Err(DaoError::NotFound),
        }
    }

    pub async fn delete(&self, id: ObjectId) -> DaoResult<()> {
        if self.base.hard_delete(doc! { "_id": id }).await? == 0 {
            return Err(DaoError::NotFound);
        }
        Ok(())
    }
}
