//! Visits repository: Postgres implementation of the visit store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::visit::{DailyVisitAggregate, DailyVisitAggregateRow, Role, VisitDetail},
    repository::VisitStore,
};

#[derive(Clone)]
pub struct VisitsRepository {
    pool: Pool<Postgres>,
}

impl VisitsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitStore for VisitsRepository {
    /// Record a first visit of the day, pairing the detail insert with the
    /// aggregate increment in one transaction.
    ///
    /// The unique constraint on (visit_date, identity_key) serializes
    /// concurrent callers for the same identity: exactly one insert wins,
    /// the others see zero rows affected and roll back without touching the
    /// aggregate.
    async fn record_if_absent(
        &self,
        day: NaiveDate,
        identity_key: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO visit_details (visit_date, identity_key, role, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (visit_date, identity_key) DO NOTHING
            "#,
        )
        .bind(day)
        .bind(identity_key)
        .bind(role)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if !inserted {
            // Already counted today
            tx.rollback().await?;
            return Ok(false);
        }

        let one = |r: Role| -> i32 { (r == role) as i32 };

        sqlx::query(
            r#"
            INSERT INTO daily_visit_totals
                (visit_date, total, admin_count, editor_count, leader_count, reader_count, anonymous_count)
            VALUES ($1, 1, $2, $3, $4, $5, $6)
            ON CONFLICT (visit_date) DO UPDATE SET
                total = daily_visit_totals.total + 1,
                admin_count = daily_visit_totals.admin_count + EXCLUDED.admin_count,
                editor_count = daily_visit_totals.editor_count + EXCLUDED.editor_count,
                leader_count = daily_visit_totals.leader_count + EXCLUDED.leader_count,
                reader_count = daily_visit_totals.reader_count + EXCLUDED.reader_count,
                anonymous_count = daily_visit_totals.anonymous_count + EXCLUDED.anonymous_count
            "#,
        )
        .bind(day)
        .bind(one(Role::Admin))
        .bind(one(Role::Editor))
        .bind(one(Role::Leader))
        .bind(one(Role::Reader))
        .bind(one(Role::Anonymous))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Get one day's aggregate
    async fn get_day(&self, day: NaiveDate) -> AppResult<Option<DailyVisitAggregate>> {
        let row = sqlx::query_as::<_, DailyVisitAggregateRow>(
            "SELECT * FROM daily_visit_totals WHERE visit_date = $1",
        )
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DailyVisitAggregate::from))
    }

    /// List daily aggregates, optionally filtered by date range
    async fn list_days(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> AppResult<Vec<DailyVisitAggregate>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if start_date.is_some() {
            conditions.push(format!("visit_date >= ${}", idx));
            idx += 1;
        }
        if end_date.is_some() {
            conditions.push(format!("visit_date <= ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT * FROM daily_visit_totals {} ORDER BY visit_date DESC",
            where_clause
        );

        let mut builder = sqlx::query_as::<_, DailyVisitAggregateRow>(&query);
        if let Some(sd) = start_date {
            builder = builder.bind(sd);
        }
        if let Some(ed) = end_date {
            builder = builder.bind(ed);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(DailyVisitAggregate::from).collect())
    }

    /// Get total visit count for a date range
    async fn total_between(&self, start_date: NaiveDate, end_date: NaiveDate) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total), 0)::bigint FROM daily_visit_totals WHERE visit_date >= $1 AND visit_date <= $2"
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// List the detail rows for one day
    async fn list_details(&self, day: NaiveDate) -> AppResult<Vec<VisitDetail>> {
        let details = sqlx::query_as::<_, VisitDetail>(
            "SELECT * FROM visit_details WHERE visit_date = $1 ORDER BY created_at",
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// Purge one day's details and aggregate
    async fn purge_day(&self, day: NaiveDate) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM visit_details WHERE visit_date = $1")
            .bind(day)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM daily_visit_totals WHERE visit_date = $1")
            .bind(day)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(removed)
    }
}
