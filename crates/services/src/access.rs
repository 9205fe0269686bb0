//! Authorization checks that combine the global role with team membership.

use bson::oid::ObjectId;
use okrhub_db::models::{Permissions, Role, Team, TeamRole, User};

/// super_admin, or any role within its own organization.
pub fn can_access_organization(user: &User, organization_id: ObjectId) -> bool {
    user.role == Role::SuperAdmin || user.belongs_to(organization_id)
}

/// `permission` held within `organization_id`.
pub fn has_organization_permission(
    user: &User,
    organization_id: ObjectId,
    permission: Permissions,
) -> bool {
    can_access_organization(user, organization_id) && user.role.has_permission(permission)
}

fn is_org_admin_of(user: &User, team: &Team) -> bool {
    user.role == Role::OrgAdmin && user.belongs_to(team.organization_id)
}

pub fn can_view_team(user: &User, team: &Team) -> bool {
    if user.role == Role::SuperAdmin || is_org_admin_of(user, team) {
        return true;
    }
    user.id.is_some_and(|id| team.is_member(id))
}

/// Team management: super_admin, the organization's admin, or the team's
/// leader when their global role grants `permission`.
pub fn can_manage_team(user: &User, team: &Team, permission: Permissions) -> bool {
    if user.role == Role::SuperAdmin || is_org_admin_of(user, team) {
        return true;
    }
    let Some(user_id) = user.id else {
        return false;
    };
    team.get_user_role(user_id) == Some(TeamRole::Leader)
        && user.belongs_to(team.organization_id)
        && user.role.has_permission(permission)
}

/// Recording KPI readings is open to every team member with the permission.
pub fn can_update_kpi_values(user: &User, team: &Team) -> bool {
    if user.role == Role::SuperAdmin || is_org_admin_of(user, team) {
        return true;
    }
    user.id.is_some_and(|id| team.is_member(id))
        && user.role.has_permission(Permissions::UPDATE_KPI_VALUES)
}
