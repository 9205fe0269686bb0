pub mod audit_log;
pub mod base;
pub mod dependency;
pub mod invitation;
pub mod key_result;
pub mod kpi;
pub mod objective;
pub mod organization;
pub mod team;
pub mod template;
pub mod user;

pub use base::BaseDao;
