use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use okrhub_db::models::{
    Invitation, InvitationStatus, Role, Team, TeamMember, TeamRole, User,
};
use thiserror::Error;
use tracing::{info, warn};

use super::base::{BaseDao, DaoError, DaoResult};

const TOKEN_LENGTH: usize = 32;
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum InvitationError {
    #[error("Invitation not found")]
    NotFound,
    #[error("Invitation has expired")]
    Expired,
    #[error("Invitation has already been {}", .0.as_str())]
    AlreadyUsed(InvitationStatus),
    #[error("This invitation was sent to a different email address")]
    EmailMismatch,
    #[error("You already belong to another organization")]
    OrganizationMismatch,
    #[error(transparent)]
    Dao(#[from] DaoError),
}

pub struct InvitationDao {
    pub base: BaseDao<Invitation>,
    pub teams: BaseDao<Team>,
    pub users: BaseDao<User>,
}

impl InvitationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Invitation::COLLECTION),
            teams: BaseDao::new(db, Team::COLLECTION),
            users: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        team: &Team,
        email: &str,
        name: &str,
        role: TeamRole,
        invited_by: ObjectId,
        ttl_days: i64,
    ) -> DaoResult<Invitation> {
        let team_id = team.id.ok_or(DaoError::NotFound)?;
        let email = email.trim().to_lowercase();

        if team.has_member_email(&email) {
            return Err(DaoError::Conflict(format!("{email} is already a member of this team")));
        }

        let now = DateTime::now();
        let live = self
            .base
            .count(doc! {
                "team_id": team_id,
                "email": &email,
                "status": InvitationStatus::Pending.as_str(),
                "expires_at": { "$gt": now },
            })
            .await?;
        if live > 0 {
            return Err(DaoError::Conflict(format!(
                "{email} already has a pending invitation to this team"
            )));
        }

        let invitation = Invitation {
            id: None,
            organization_id: team.organization_id,
            team_id,
            email,
            name: name.trim().to_string(),
            role,
            token: nanoid::nanoid!(TOKEN_LENGTH),
            status: InvitationStatus::Pending,
            expires_at: DateTime::from_millis(now.timestamp_millis() + ttl_days * DAY_MS),
            invited_by,
            accepted_at: None,
            accepted_by: None,
            bounced_at: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&invitation).await?;
        info!(?id, ?team_id, "Invitation created");
        self.base.find_by_id(id).await
    }

    /// Raw stored row; callers report `effective_status` rather than `status`.
    pub async fn find_by_token(&self, token: &str) -> DaoResult<Invitation> {
        self.base
            .find_one(doc! { "token": token })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn list_for_team(&self, team_id: ObjectId) -> DaoResult<Vec<Invitation>> {
        self.base
            .find_many(doc! { "team_id": team_id }, Some(doc! { "created_at": -1 }))
            .await
    }

    /// Consumes a pending invitation exactly once and adds `user` to the team.
    ///
    /// The pending -> accepted flip is a single conditional update, so of two
    /// concurrent accepts only one can match; the other sees `AlreadyUsed`.
    pub async fn accept(&self, token: &str, user: &User) -> Result<Team, InvitationError> {
        let user_id = user.id.ok_or(InvitationError::NotFound)?;
        let invitation = match self.find_by_token(token).await {
            Ok(inv) => inv,
            Err(DaoError::NotFound) => return Err(InvitationError::NotFound),
            Err(e) => return Err(e.into()),
        };

        let now = DateTime::now();
        match invitation.effective_status(now) {
            InvitationStatus::Pending => {}
            InvitationStatus::Expired => {
                self.persist_expired(token).await?;
                return Err(InvitationError::Expired);
            }
            status => return Err(InvitationError::AlreadyUsed(status)),
        }

        if !invitation.email.eq_ignore_ascii_case(user.email.trim()) {
            return Err(InvitationError::EmailMismatch);
        }
        if user.role != Role::SuperAdmin
            && user
                .organization_id
                .is_some_and(|org| org != invitation.organization_id)
        {
            return Err(InvitationError::OrganizationMismatch);
        }

        let accepted = self
            .base
            .find_one_and_update(
                doc! {
                    "token": token,
                    "status": InvitationStatus::Pending.as_str(),
                    "expires_at": { "$gt": now },
                },
                doc! {
                    "$set": {
                        "status": InvitationStatus::Accepted.as_str(),
                        "accepted_at": now,
                        "accepted_by": user_id,
                    }
                },
            )
            .await?;

        let Some(accepted) = accepted else {
            let current = self.find_by_token(token).await?;
            return Err(match current.effective_status(DateTime::now()) {
                InvitationStatus::Expired => InvitationError::Expired,
                status => InvitationError::AlreadyUsed(status),
            });
        };

        let member = TeamMember {
            user_id,
            role: accepted.role,
            email: user.email.clone(),
            name: user.name.clone(),
            joined_at: now,
        };
        let pushed = self
            .teams
            .update_one(
                doc! {
                    "_id": accepted.team_id,
                    "deleted_at": null,
                    "members.user_id": { "$ne": user_id },
                },
                doc! { "$push": { "members": bson::to_bson(&member).map_err(DaoError::from)? } },
            )
            .await?;
        // A team deleted since the invitation was sent leaves the push
        // unmatched; the acceptance is rolled back in that case.
        if !pushed {
            match self.teams.find_live(accepted.team_id).await {
                Ok(_) => {
                    warn!(?user_id, team_id = ?accepted.team_id, "Accepted invitation for an existing member");
                }
                Err(DaoError::NotFound) => {
                    self.revert_acceptance(token, user_id).await?;
                    return Err(InvitationError::NotFound);
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.promote_on_join(user, &accepted).await?;

        info!(?user_id, team_id = ?accepted.team_id, "Invitation accepted");
        Ok(self.teams.find_by_id(accepted.team_id).await?)
    }

    /// Places a newly joined account into the invitation's organization and
    /// raises its global role to match the team role when that is higher.
    async fn promote_on_join(&self, user: &User, invitation: &Invitation) -> DaoResult<()> {
        let Some(user_id) = user.id else {
            return Ok(());
        };
        let target = invitation.role.global_role();

        if user.organization_id.is_none() && user.role != Role::SuperAdmin {
            self.users
                .update_by_id(
                    user_id,
                    doc! {
                        "$set": {
                            "organization_id": invitation.organization_id,
                            "role": target.as_str(),
                        }
                    },
                )
                .await?;
        } else if user.role != Role::SuperAdmin && !user.role.is_at_least(target) {
            self.users
                .update_by_id(user_id, doc! { "$set": { "role": target.as_str() } })
                .await?;
        }
        Ok(())
    }

    /// Puts an accepted invitation back to pending when the membership could
    /// not be written (the team disappeared between the two updates).
    async fn revert_acceptance(&self, token: &str, user_id: ObjectId) -> DaoResult<bool> {
        let reverted = self
            .base
            .update_one(
                doc! {
                    "token": token,
                    "status": InvitationStatus::Accepted.as_str(),
                    "accepted_by": user_id,
                },
                doc! {
                    "$set": { "status": InvitationStatus::Pending.as_str() },
                    "$unset": { "accepted_at": "", "accepted_by": "" },
                },
            )
            .await?;
        warn!(?user_id, reverted, "Team gone after accept; invitation reopened");
        Ok(reverted)
    }

    async fn persist_expired(&self, token: &str) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "token": token, "status": InvitationStatus::Pending.as_str() },
                doc! { "$set": { "status": InvitationStatus::Expired.as_str() } },
            )
            .await
    }

    /// Persists `expired` on every overdue pending invitation.
    pub async fn expire_overdue(&self) -> DaoResult<u64> {
        let count = self
            .base
            .update_many(
                doc! {
                    "status": InvitationStatus::Pending.as_str(),
                    "expires_at": { "$lte": DateTime::now() },
                },
                doc! { "$set": { "status": InvitationStatus::Expired.as_str() } },
            )
            .await?;
        if count > 0 {
            info!(count, "Expired overdue invitations");
        }
        Ok(count)
    }

    /// Marks every pending invitation addressed to `email` as bounced.
    pub async fn mark_bounced(&self, email: &str) -> DaoResult<u64> {
        let email = email.trim().to_lowercase();
        let count = self
            .base
            .update_many(
                doc! { "email": &email, "status": InvitationStatus::Pending.as_str() },
                doc! {
                    "$set": {
                        "status": InvitationStatus::Bounced.as_str(),
                        "bounced_at": DateTime::now(),
                    }
                },
            )
            .await?;
        info!(%email, count, "Marked invitations bounced");
        Ok(count)
    }
}
