//! Users repository for role lookups

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::user::UserRoleRow, repository::RoleSource};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleSource for UsersRepository {
    /// Get the stored role attribute and admin claim mirror for an account
    async fn role_attributes(&self, user_id: i32) -> AppResult<Option<UserRoleRow>> {
        let row = sqlx::query_as::<_, UserRoleRow>(
            "SELECT id, role, is_admin FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
