mod affiliation;
mod user;

pub use affiliation::{StudentAffiliation, TeachingAffiliation};
pub use user::{Actor, UserRole, UserSummary};
