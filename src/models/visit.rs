//! Visit tracking models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Visitor role used for per-role aggregate bucketing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Leader,
    Reader,
    Anonymous,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Leader => "leader",
            Role::Reader => "reader",
            Role::Anonymous => "anonymous",
        }
    }

    /// All roles, in aggregate column order
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Editor,
        Role::Leader,
        Role::Reader,
        Role::Anonymous,
    ];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "leader" => Ok(Role::Leader),
            "reader" => Ok(Role::Reader),
            "anonymous" => Ok(Role::Anonymous),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as text)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Resolved visiting identity used to deduplicate visits.
///
/// The string key is stable for a given visitor: `auth:<account id>` for
/// signed-in users, `anon:<device token>` for anonymous callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitIdentity {
    Auth(i32),
    Anon(String),
}

impl VisitIdentity {
    pub fn key(&self) -> String {
        match self {
            VisitIdentity::Auth(id) => format!("auth:{}", id),
            VisitIdentity::Anon(token) => format!("anon:{}", token),
        }
    }
}

impl std::fmt::Display for VisitIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Per-(day, identity) marker row; its existence is the dedup mechanism
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VisitDetail {
    pub id: i64,
    /// Day of the visit
    pub visit_date: NaiveDate,
    /// Identity key (`auth:<id>` or `anon:<token>`)
    pub identity_key: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Per-role visit counters for one day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoleCounts {
    pub admin: i32,
    pub editor: i32,
    pub leader: i32,
    pub reader: i32,
    pub anonymous: i32,
}

impl RoleCounts {
    pub fn get(&self, role: Role) -> i32 {
        match role {
            Role::Admin => self.admin,
            Role::Editor => self.editor,
            Role::Leader => self.leader,
            Role::Reader => self.reader,
            Role::Anonymous => self.anonymous,
        }
    }

    pub fn sum(&self) -> i32 {
        self.admin + self.editor + self.leader + self.reader + self.anonymous
    }
}

/// Per-day visit summary: total plus per-role buckets.
///
/// Invariant: `total == roles.sum() == number of detail rows for the day`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyVisitAggregate {
    pub visit_date: NaiveDate,
    pub total: i32,
    pub roles: RoleCounts,
}

/// Internal row structure for aggregate queries
#[derive(Debug, Clone, FromRow)]
pub struct DailyVisitAggregateRow {
    pub visit_date: NaiveDate,
    pub total: i32,
    pub admin_count: i32,
    pub editor_count: i32,
    pub leader_count: i32,
    pub reader_count: i32,
    pub anonymous_count: i32,
}

impl From<DailyVisitAggregateRow> for DailyVisitAggregate {
    fn from(row: DailyVisitAggregateRow) -> Self {
        DailyVisitAggregate {
            visit_date: row.visit_date,
            total: row.total,
            roles: RoleCounts {
                admin: row.admin_count,
                editor: row.editor_count,
                leader: row.leader_count,
                reader: row.reader_count,
                anonymous: row.anonymous_count,
            },
        }
    }
}

/// Track visit request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct TrackVisitRequest {
    /// Device token previously handed out to this browser/device, if any
    #[validate(length(min = 8, max = 128, message = "Invalid device token length"))]
    pub device_token: Option<String>,
}

/// Track visit response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackVisitResponse {
    /// Canonical device token the client should persist locally
    pub device_token: String,
}

/// Query parameters for visit aggregates
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct VisitQuery {
    /// Start date (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// End date (YYYY-MM-DD)
    pub end_date: Option<String>,
}

/// Total visits over a date range
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VisitTotalResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total: i64,
}
