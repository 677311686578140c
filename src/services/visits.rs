//! Visit tracking service
//!
//! The aggregator guarantees that each visiting identity contributes exactly
//! one count to exactly one day's totals, no matter how many times the
//! tracking call fires that day and regardless of concurrent callers. The
//! existence check and both writes happen inside a single store transaction
//! keyed by (day, identity); see [`VisitStore::record_if_absent`].

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::{
    error::AppResult,
    models::{
        user::UserClaims,
        visit::{DailyVisitAggregate, Role, VisitDetail, VisitIdentity},
    },
    repository::VisitStore,
    services::identity::IdentityResolver,
};

#[derive(Clone)]
pub struct VisitsService {
    store: Arc<dyn VisitStore>,
    resolver: IdentityResolver,
}

impl VisitsService {
    pub fn new(store: Arc<dyn VisitStore>, resolver: IdentityResolver) -> Self {
        Self { store, resolver }
    }

    /// Record today's visit for the caller, at most once per identity per
    /// day.
    ///
    /// Best-effort by design: a store failure is logged and swallowed so
    /// that visit analytics can never degrade the caller. Returns the
    /// canonical device token for the client to persist.
    pub async fn track_visit(
        &self,
        claims: Option<UserClaims>,
        device_token: Option<String>,
    ) -> String {
        let visitor = self.resolver.resolve(claims.as_ref(), device_token).await;
        // Day boundaries are server-canonical UTC
        let day = Utc::now().date_naive();

        if let Err(e) = self.record_for_day(day, &visitor.identity, visitor.role).await {
            tracing::warn!(
                identity = %visitor.identity,
                day = %day,
                "Failed to record visit: {}",
                e
            );
        }

        visitor.device_token
    }

    /// Record a visit for an explicit day. Idempotent per (day, identity).
    async fn record_for_day(
        &self,
        day: NaiveDate,
        identity: &VisitIdentity,
        role: Role,
    ) -> AppResult<bool> {
        let recorded = self
            .store
            .record_if_absent(day, &identity.key(), role, Utc::now())
            .await?;

        if recorded {
            tracing::debug!(identity = %identity, day = %day, role = %role, "Visit recorded");
        }

        Ok(recorded)
    }

    /// List daily aggregates for a date range
    pub async fn list(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> AppResult<Vec<DailyVisitAggregate>> {
        self.store.list_days(start_date, end_date).await
    }

    /// Get one day's aggregate
    pub async fn get_day(&self, day: NaiveDate) -> AppResult<Option<DailyVisitAggregate>> {
        self.store.get_day(day).await
    }

    /// Get total visit count for a date range
    pub async fn total(&self, start_date: NaiveDate, end_date: NaiveDate) -> AppResult<i64> {
        self.store.total_between(start_date, end_date).await
    }

    /// List the detail rows for one day
    pub async fn details(&self, day: NaiveDate) -> AppResult<Vec<VisitDetail>> {
        self.store.list_details(day).await
    }

    /// Maintenance: purge one day's details and aggregate
    pub async fn purge_day(&self, day: NaiveDate) -> AppResult<u64> {
        self.store.purge_day(day).await
    }
}
