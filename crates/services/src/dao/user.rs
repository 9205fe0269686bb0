use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use okrhub_db::models::{Role, User, user::PENDING_EXTERNAL_PREFIX};
use tracing::{info, warn};

use super::base::{BaseDao, DaoError, DaoResult};

/// Profile fields reported by the identity provider for one subject.
#[derive(Debug, Clone)]
pub struct IdentityProfile {
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
}

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn find_by_external_id(&self, external_id: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "external_id": external_id })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_super_admin(&self) -> DaoResult<Option<User>> {
        self.base
            .find_one(doc! { "role": Role::SuperAdmin.as_str() })
            .await
    }

    /// Upserts the account behind an identity-provider subject.
    ///
    /// Lookup order: existing subject, then a `pending_` placeholder with the
    /// same email (claimed in place), then a fresh insert. A fresh account is
    /// `pending` unless its email is the configured super admin and no super
    /// admin exists yet.
    pub async fn sync_identity(
        &self,
        profile: IdentityProfile,
        super_admin_email: Option<&str>,
    ) -> DaoResult<User> {
        let email = profile.email.trim().to_lowercase();
        let now = DateTime::now();

        if let Some(existing) = self
            .base
            .find_one(doc! { "external_id": &profile.external_id })
            .await?
        {
            let id = existing.id.ok_or(DaoError::NotFound)?;
            self.base
                .update_by_id(
                    id,
                    doc! {
                        "$set": {
                            "email": &email,
                            "name": &profile.name,
                            "image_url": profile.image_url.as_deref(),
                            "last_sign_in_at": now,
                        }
                    },
                )
                .await?;
            return self.base.find_by_id(id).await;
        }

        if let Some(by_email) = self.base.find_one(doc! { "email": &email }).await? {
            if !by_email.is_placeholder() {
                warn!(%email, "Email already bound to another identity");
                return Err(DaoError::DuplicateKey(format!(
                    "{email} is already linked to another account"
                )));
            }
            let id = by_email.id.ok_or(DaoError::NotFound)?;
            self.base
                .update_by_id(
                    id,
                    doc! {
                        "$set": {
                            "external_id": &profile.external_id,
                            "name": &profile.name,
                            "image_url": profile.image_url.as_deref(),
                            "last_sign_in_at": now,
                        }
                    },
                )
                .await?;
            info!(%email, "Claimed placeholder account");
            return self.base.find_by_id(id).await;
        }

        let is_super_admin = match super_admin_email {
            Some(admin) if admin.trim().eq_ignore_ascii_case(&email) => {
                self.find_super_admin().await?.is_none()
            }
            _ => false,
        };

        let user = User {
            id: None,
            external_id: profile.external_id,
            email,
            name: profile.name,
            image_url: profile.image_url,
            role: if is_super_admin { Role::SuperAdmin } else { Role::Pending },
            organization_id: None,
            last_sign_in_at: Some(now),
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&user).await?;
        info!(?id, role = %user.role, "Created user from identity");
        self.base.find_by_id(id).await
    }

    /// Creates an account ahead of its owner's first sign-in.
    pub async fn create_placeholder(
        &self,
        email: &str,
        name: &str,
        role: Role,
        organization_id: ObjectId,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            external_id: format!("{PENDING_EXTERNAL_PREFIX}{}", nanoid::nanoid!()),
            email: email.trim().to_lowercase(),
            name: name.to_string(),
            image_url: None,
            role,
            organization_id: Some(organization_id),
            last_sign_in_at: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn list_by_organization(&self, organization_id: ObjectId) -> DaoResult<Vec<User>> {
        self.base
            .find_many(
                doc! { "organization_id": organization_id },
                Some(doc! { "name": 1 }),
            )
            .await
    }

    pub async fn set_role(&self, user_id: ObjectId, role: Role) -> DaoResult<User> {
        self.base
            .update_by_id(user_id, doc! { "$set": { "role": role.as_str() } })
            .await?;
        self.base.find_by_id(user_id).await
    }

    pub async fn assign_organization(
        &self,
        user_id: ObjectId,
        organization_id: ObjectId,
        role: Role,
    ) -> DaoResult<User> {
        // Only an account without an organization can be placed into one.
        let assigned = self
            .base
            .update_one(
                doc! { "_id": user_id, "organization_id": null },
                doc! {
                    "$set": {
                        "organization_id": organization_id,
                        "role": role.as_str(),
                    }
                },
            )
            .await?;
        if !assigned {
            return Err(DaoError::Conflict(
                "You already belong to an organization".to_string(),
            ));
        }
        self.base.find_by_id(user_id).await
    }

    pub async fn delete_by_external_id(&self, external_id: &str) -> DaoResult<u64> {
        self.base
            .hard_delete(doc! { "external_id": external_id })
            .await
    }
}
