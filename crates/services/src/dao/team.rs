use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::Database;
use okrhub_db::models::{Team, TeamMember, TeamRole, User};
use tracing::debug;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct TeamDao {
    pub base: BaseDao<Team>,
}

impl TeamDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Team::COLLECTION),
        }
    }

    /// Creates a team whose first member, and leader, is `creator`.
    pub async fn create(
        &self,
        organization_id: ObjectId,
        name: &str,
        description: Option<String>,
        creator: &User,
    ) -> DaoResult<Team> {
        let creator_id = creator.id.ok_or(DaoError::NotFound)?;
        let now = DateTime::now();
        let team = Team {
            id: None,
            organization_id,
            name: name.trim().to_string(),
            description,
            leader_id: creator_id,
            members: vec![TeamMember {
                user_id: creator_id,
                role: TeamRole::Leader,
                email: creator.email.clone(),
                name: creator.name.clone(),
                joined_at: now,
            }],
            created_by: creator_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = self.base.insert_one(&team).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find(&self, id: ObjectId) -> DaoResult<Team> {
        self.base.find_live(id).await
    }

    pub async fn list_for_organization(&self, organization_id: ObjectId) -> DaoResult<Vec<Team>> {
        self.base
            .find_many(
                doc! { "organization_id": organization_id, "deleted_at": null },
                Some(doc! { "name": 1 }),
            )
            .await
    }

    pub async fn list_for_member(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Vec<Team>> {
        self.base
            .find_many(
                doc! {
                    "organization_id": organization_id,
                    "members.user_id": user_id,
                    "deleted_at": null,
                },
                Some(doc! { "name": 1 }),
            )
            .await
    }

    pub async fn update(
        &self,
        id: ObjectId,
        name: Option<String>,
        description: Option<String>,
    ) -> DaoResult<Team> {
        let mut set = Document::new();
        if let Some(name) = name {
            set.insert("name", name.trim());
        }
        if let Some(description) = description {
            set.insert("description", description);
        }
        if !set.is_empty() {
            self.base
                .update_one(doc! { "_id": id, "deleted_at": null }, doc! { "$set": set })
                .await?;
        }
        self.find(id).await
    }

    pub async fn delete(&self, id: ObjectId) -> DaoResult<bool> {
        self.base.soft_delete(id).await
    }

    /// Appends `member` unless the user is already on the team.
    /// Returns `false` when the push was skipped.
    pub async fn add_member(&self, team_id: ObjectId, member: TeamMember) -> DaoResult<bool> {
        let user_id = member.user_id;
        let added = self
            .base
            .update_one(
                doc! {
                    "_id": team_id,
                    "deleted_at": null,
                    "members.user_id": { "$ne": user_id },
                },
                doc! { "$push": { "members": bson::to_bson(&member)? } },
            )
            .await?;
        debug!(?team_id, ?user_id, added, "Add team member");
        Ok(added)
    }

    /// Removes a non-leader member; a team never drops to zero members.
    pub async fn remove_member(&self, team_id: ObjectId, user_id: ObjectId) -> DaoResult<Team> {
        let team = self.find(team_id).await?;
        if !team.is_member(user_id) {
            return Err(DaoError::NotFound);
        }
        if team.leader_id == user_id {
            return Err(DaoError::Conflict(
                "The team leader cannot be removed".to_string(),
            ));
        }

        let removed = self
            .base
            .update_one(
                doc! {
                    "_id": team_id,
                    "leader_id": { "$ne": user_id },
                    "members.1": { "$exists": true },
                },
                doc! { "$pull": { "members": { "user_id": user_id } } },
            )
            .await?;
        if !removed {
            return Err(DaoError::Conflict(
                "A team must keep at least one member".to_string(),
            ));
        }

        self.find(team_id).await
    }

    /// Drops `user_id` from every live team. Where the user led a team, the
    /// longest-standing remaining member takes over; a team left without
    /// members is soft-deleted. Returns the number of teams touched.
    pub async fn remove_user_everywhere(&self, user_id: ObjectId) -> DaoResult<u64> {
        let teams = self
            .base
            .find_many(doc! { "members.user_id": user_id, "deleted_at": null }, None)
            .await?;

        let mut touched = 0;
        for team in teams {
            let Some(team_id) = team.id else { continue };
            let successor = team
                .members
                .iter()
                .filter(|m| m.user_id != user_id)
                .min_by_key(|m| (m.role != TeamRole::Leader, m.joined_at.timestamp_millis()))
                .map(|m| m.user_id);

            let Some(successor) = successor else {
                self.base.soft_delete(team_id).await?;
                debug!(?team_id, ?user_id, "Deleted team left without members");
                touched += 1;
                continue;
            };

            self.base
                .update_one(
                    doc! { "_id": team_id },
                    doc! { "$pull": { "members": { "user_id": user_id } } },
                )
                .await?;
            if team.leader_id == user_id {
                self.base
                    .update_one(
                        doc! { "_id": team_id, "members.user_id": successor },
                        doc! { "$set": { "leader_id": successor, "members.$.role": "leader" } },
                    )
                    .await?;
                debug!(?team_id, ?successor, "Handed team leadership over");
            }
            touched += 1;
        }
        Ok(touched)
    }
}
