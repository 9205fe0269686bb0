pub mod audit_log;
pub mod dependency;
pub mod invitation;
pub mod key_result;
pub mod kpi;
pub mod objective;
pub mod organization;
pub mod role;
pub mod team;
pub mod template;
pub mod user;

pub use audit_log::{ActorType, AuditChange, AuditLog};
pub use dependency::{DependencyType, ObjectiveDependency};
pub use invitation::{Invitation, InvitationStatus};
pub use key_result::OperationalKeyResult;
pub use kpi::{Kpi, KpiFrequency, KpiReading};
pub use objective::{Milestone, ProgressStatus, StrategicObjective};
pub use organization::{
    ContactPerson, Organization, OrganizationStatus, Plan, Subscription, SubscriptionStatus,
};
pub use role::{Permissions, Role, TeamRole};
pub use team::{Team, TeamMember};
pub use template::{ObjectiveTemplate, TemplateKeyResult, TemplateKpi};
pub use user::User;
