use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Global account role. Team-scoped roles live on [`TeamRole`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    OrgAdmin,
    TeamLeader,
    TeamMember,
    #[default]
    Pending,
}

impl Role {
    pub fn level(self) -> u8 {
        match self {
            Role::SuperAdmin => 4,
            Role::OrgAdmin => 3,
            Role::TeamLeader => 2,
            Role::TeamMember => 1,
            Role::Pending => 0,
        }
    }

    pub fn is_at_least(self, other: Role) -> bool {
        self.level() >= other.level()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::OrgAdmin => "org_admin",
            Role::TeamLeader => "team_leader",
            Role::TeamMember => "team_member",
            Role::Pending => "pending",
        }
    }

    pub fn permissions(self) -> Permissions {
        match self {
            Role::SuperAdmin => Permissions::all(),
            Role::OrgAdmin => Permissions::ORG_ADMIN,
            Role::TeamLeader => Permissions::TEAM_LEADER,
            Role::TeamMember => Permissions::TEAM_MEMBER,
            Role::Pending => Permissions::empty(),
        }
    }

    /// super_admin short-circuits; every other role consults the static table.
    pub fn has_permission(self, permission: Permissions) -> bool {
        if self == Role::SuperAdmin {
            return true;
        }
        self.permissions().contains(permission)
    }

    /// Global roles are only ever reassigned by the super admin, and never to super_admin.
    pub fn can_assign(self, target: Role) -> bool {
        self == Role::SuperAdmin && target != Role::SuperAdmin
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a user inside one team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Leader,
    Member,
}

impl TeamRole {
    /// Global role granted to a pending account that joins a team with this role.
    pub fn global_role(self) -> Role {
        match self {
            TeamRole::Leader => Role::TeamLeader,
            TeamRole::Member => Role::TeamMember,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u32 {
        const VIEW_ORGANIZATION = 1 << 0;
        const MANAGE_ORGANIZATIONS = 1 << 1;
        const MANAGE_USERS = 1 << 2;
        const MANAGE_TEAMS = 1 << 3;
        const VIEW_ALL_TEAMS = 1 << 4;
        const VIEW_TEAM = 1 << 5;
        const INVITE_MEMBERS = 1 << 6;
        const MANAGE_OBJECTIVES = 1 << 7;
        const MANAGE_KEY_RESULTS = 1 << 8;
        const MANAGE_KPIS = 1 << 9;
        const UPDATE_KPI_VALUES = 1 << 10;
        const VIEW_ANALYTICS = 1 << 11;
        const VIEW_AUDIT_LOGS = 1 << 12;
        const MANAGE_TEMPLATES = 1 << 13;

        const TEAM_MEMBER = Self::VIEW_ORGANIZATION.bits()
            | Self::VIEW_TEAM.bits()
            | Self::UPDATE_KPI_VALUES.bits();

        const TEAM_LEADER = Self::TEAM_MEMBER.bits()
            | Self::INVITE_MEMBERS.bits()
            | Self::MANAGE_OBJECTIVES.bits()
            | Self::MANAGE_KEY_RESULTS.bits()
            | Self::MANAGE_KPIS.bits()
            | Self::VIEW_ANALYTICS.bits();

        /// Everything except cross-organization management.
        const ORG_ADMIN = Self::TEAM_LEADER.bits()
            | Self::MANAGE_USERS.bits()
            | Self::MANAGE_TEAMS.bits()
            | Self::VIEW_ALL_TEAMS.bits()
            | Self::VIEW_AUDIT_LOGS.bits()
            | Self::MANAGE_TEMPLATES.bits();
    }
}

impl Permissions {
    /// snake_case names of the individual flags, for API responses.
    pub fn names(self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect()
    }
}
