use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::Database;
use okrhub_db::models::{
    ContactPerson, Organization, OrganizationStatus, Plan, Subscription, SubscriptionStatus,
};

use super::base::{BaseDao, DaoError, DaoResult};

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub contact_person: Option<ContactPerson>,
    pub status: Option<OrganizationStatus>,
    pub plan: Option<Plan>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub subscription_end_date: Option<DateTime>,
}

impl OrganizationUpdate {
    fn to_set_document(&self) -> DaoResult<Document> {
        let mut set = Document::new();
        if let Some(name) = &self.name {
            set.insert("name", name.trim());
        }
        if let Some(contact) = &self.contact_person {
            set.insert("contact_person", bson::to_bson(contact)?);
        }
        if let Some(status) = self.status {
            set.insert("status", bson::to_bson(&status)?);
        }
        if let Some(plan) = self.plan {
            set.insert("subscription.plan", bson::to_bson(&plan)?);
        }
        if let Some(status) = self.subscription_status {
            set.insert("subscription.status", bson::to_bson(&status)?);
        }
        if let Some(end) = self.subscription_end_date {
            set.insert("subscription.end_date", end);
        }
        Ok(set)
    }

    pub fn touches_billing(&self) -> bool {
        self.status.is_some()
            || self.plan.is_some()
            || self.subscription_status.is_some()
            || self.subscription_end_date.is_some()
    }
}

pub struct OrganizationDao {
    pub base: BaseDao<Organization>,
}

impl OrganizationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Organization::COLLECTION),
        }
    }

    /// The single creation routine for every signup and admin path: new
    /// organizations always start `active` with an `active` subscription.
    pub async fn create(
        &self,
        name: &str,
        contact_person: ContactPerson,
        plan: Plan,
        created_by: Option<ObjectId>,
    ) -> DaoResult<Organization> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DaoError::Validation("Organization name is required".to_string()));
        }

        let now = DateTime::now();
        let organization = Organization {
            id: None,
            name: name.to_string(),
            contact_person: ContactPerson {
                name: contact_person.name,
                email: contact_person.email.trim().to_lowercase(),
            },
            status: OrganizationStatus::Active,
            subscription: Subscription {
                plan,
                status: SubscriptionStatus::Active,
                start_date: now,
                end_date: None,
            },
            created_by,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&organization).await?;
        self.base.find_by_id(id).await
    }

    pub async fn list_all(&self) -> DaoResult<Vec<Organization>> {
        self.base.find_many(doc! {}, Some(doc! { "name": 1 })).await
    }

    pub async fn update(&self, id: ObjectId, update: &OrganizationUpdate) -> DaoResult<Organization> {
        let set = update.to_set_document()?;
        if !set.is_empty() {
            self.base.update_by_id(id, doc! { "$set": set }).await?;
        }
        self.base.find_by_id(id).await
    }
}
