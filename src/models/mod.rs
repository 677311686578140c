//! Data models for Presença

pub mod user;
pub mod visit;

// Re-export commonly used types
pub use user::UserClaims;
pub use visit::{DailyVisitAggregate, Role, VisitDetail, VisitIdentity};
