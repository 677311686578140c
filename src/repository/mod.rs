//! Repository layer for database operations

pub mod users;
pub mod visits;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        user::UserRoleRow,
        visit::{DailyVisitAggregate, Role, VisitDetail},
    },
};

/// Role-attribute lookup collaborator used by identity resolution
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleSource: Send + Sync {
    /// Stored role attribute and admin claim mirror for an account, if the
    /// account is known to this service
    async fn role_attributes(&self, user_id: i32) -> AppResult<Option<UserRoleRow>>;
}

/// Store collaborator for visit tracking.
///
/// The only mutation path is `record_if_absent`, which must perform the
/// existence check, the detail insert and the aggregate increment as one
/// atomic unit: either both writes land or neither does. Any backend that
/// provides keyed point reads plus multi-row atomic transactions can
/// implement this contract; production uses Postgres.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Record a first visit of the day for `identity_key`.
    ///
    /// Returns `true` if a new detail row was created and the day's
    /// aggregate incremented, `false` if the identity was already counted
    /// for that day (no writes performed).
    async fn record_if_absent(
        &self,
        day: NaiveDate,
        identity_key: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Get one day's aggregate, if any visit was recorded
    async fn get_day(&self, day: NaiveDate) -> AppResult<Option<DailyVisitAggregate>>;

    /// List daily aggregates, optionally bounded, newest first
    async fn list_days(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> AppResult<Vec<DailyVisitAggregate>>;

    /// Summed visit total over an inclusive date range
    async fn total_between(&self, start_date: NaiveDate, end_date: NaiveDate) -> AppResult<i64>;

    /// List the detail rows backing one day's aggregate
    async fn list_details(&self, day: NaiveDate) -> AppResult<Vec<VisitDetail>>;

    /// Maintenance: drop one day's details and aggregate. Returns the number
    /// of detail rows removed.
    async fn purge_day(&self, day: NaiveDate) -> AppResult<u64>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub visits: visits::VisitsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            visits: visits::VisitsRepository::new(pool.clone()),
            pool,
        }
    }
}
