use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use okrhub_db::models::{ActorType, AuditChange, AuditLog};
use tracing::warn;

use super::base::{BaseDao, DaoResult, PaginatedResult, PaginationParams};

pub struct AuditLogDao {
    pub base: BaseDao<AuditLog>,
}

/// Entry under construction; see `AuditLogDao::record`.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub organization_id: Option<ObjectId>,
    pub actor_id: Option<ObjectId>,
    pub actor_type: ActorType,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<ObjectId>,
    pub changes: Vec<AuditChange>,
}

impl AuditEntry {
    pub fn by_user(actor_id: Option<ObjectId>, action: &str, target_type: &str) -> Self {
        Self {
            organization_id: None,
            actor_id,
            actor_type: ActorType::User,
            action: action.to_string(),
            target_type: target_type.to_string(),
            target_id: None,
            changes: Vec::new(),
        }
    }

    pub fn by_webhook(action: &str, target_type: &str) -> Self {
        Self {
            actor_type: ActorType::Webhook,
            ..Self::by_user(None, action, target_type)
        }
    }

    pub fn by_system(action: &str, target_type: &str) -> Self {
        Self {
            actor_type: ActorType::System,
            ..Self::by_user(None, action, target_type)
        }
    }

    pub fn organization(mut self, organization_id: Option<ObjectId>) -> Self {
        self.organization_id = organization_id;
        self
    }

    pub fn target(mut self, target_id: Option<ObjectId>) -> Self {
        self.target_id = target_id;
        self
    }

    pub fn change(mut self, change: AuditChange) -> Self {
        self.changes.push(change);
        self
    }
}

impl AuditLogDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, AuditLog::COLLECTION),
        }
    }

    pub async fn insert(&self, entry: AuditEntry) -> DaoResult<ObjectId> {
        let log = AuditLog {
            id: None,
            organization_id: entry.organization_id,
            actor_id: entry.actor_id,
            actor_type: entry.actor_type,
            action: entry.action,
            target_type: entry.target_type,
            target_id: entry.target_id,
            changes: entry.changes,
            created_at: DateTime::now(),
        };
        self.base.insert_one(&log).await
    }

    /// Best-effort write; a failed audit insert never fails the caller.
    pub async fn record(&self, entry: AuditEntry) {
        let action = entry.action.clone();
        if let Err(e) = self.insert(entry).await {
            warn!(%action, error = %e, "Failed to write audit log");
        }
    }

    pub async fn list_for_organization(
        &self,
        organization_id: ObjectId,
        action: Option<&str>,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<AuditLog>> {
        let mut filter = doc! { "organization_id": organization_id };
        if let Some(action) = action {
            filter.insert("action", action);
        }
        self.base
            .find_paginated(filter, Some(doc! { "created_at": -1, "_id": -1 }), params)
            .await
    }

    pub async fn list_all(
        &self,
        action: Option<&str>,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<AuditLog>> {
        let filter = match action {
            Some(action) => doc! { "action": action },
            None => doc! {},
        };
        self.base
            .find_paginated(filter, Some(doc! { "created_at": -1, "_id": -1 }), params)
            .await
    }
}
