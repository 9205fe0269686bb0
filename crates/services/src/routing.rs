use okrhub_db::models::Role;

pub const ADMIN_ROUTE: &str = "/admin";
pub const TEAMS_ROUTE: &str = "/teams";
pub const ONBOARDING_ROUTE: &str = "/onboarding";

/// Where the web client sends a user right after sign-in.
pub fn resolve_landing_route(role: Role, organization_name: Option<&str>) -> String {
    let organization_name = organization_name.map(str::trim).filter(|n| !n.is_empty());
    match (role, organization_name) {
        (Role::SuperAdmin, _) => ADMIN_ROUTE.to_string(),
        (Role::OrgAdmin, Some(name)) => format!("/{}", urlencoding::encode(name)),
        (Role::TeamLeader | Role::TeamMember, Some(_)) => TEAMS_ROUTE.to_string(),
        _ => ONBOARDING_ROUTE.to_string(),
    }
}
