//! Visit tracking API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::visit::{
        DailyVisitAggregate, TrackVisitRequest, TrackVisitResponse, VisitDetail, VisitQuery,
        VisitTotalResponse,
    },
};

use super::{AuthenticatedUser, MaybeAuthenticatedUser};

fn parse_date(value: &str, field: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid {} format (expected YYYY-MM-DD)", field)))
}

/// A supplied device token that fails validation is treated as absent, the
/// same as a client whose token store is unavailable: the visit is still
/// recorded and a fresh token issued.
fn accepted_device_token(request: TrackVisitRequest) -> Option<String> {
    match request.validate() {
        Ok(()) => request.device_token,
        Err(e) => {
            tracing::debug!("Discarding malformed device token: {}", e);
            None
        }
    }
}

/// Record today's visit for the caller
///
/// Public endpoint fired once per application load. Idempotent per visitor
/// per day; tracking failures are never surfaced.
#[utoipa::path(
    post,
    path = "/visits/track",
    tag = "visits",
    request_body = TrackVisitRequest,
    responses(
        (status = 202, description = "Visit recorded (or already counted today)", body = TrackVisitResponse)
    )
)]
pub async fn track_visit(
    State(state): State<crate::AppState>,
    MaybeAuthenticatedUser(claims): MaybeAuthenticatedUser,
    body: Option<Json<TrackVisitRequest>>,
) -> (StatusCode, Json<TrackVisitResponse>) {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let device_token = state
        .services
        .visits
        .track_visit(claims, accepted_device_token(request))
        .await;

    (StatusCode::ACCEPTED, Json(TrackVisitResponse { device_token }))
}

/// List daily visit aggregates
#[utoipa::path(
    get,
    path = "/visits",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(VisitQuery),
    responses(
        (status = 200, description = "Daily aggregates, newest first", body = Vec<DailyVisitAggregate>)
    )
)]
pub async fn list_visits(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<Vec<DailyVisitAggregate>>> {
    claims.require_staff()?;

    let start = query
        .start_date
        .as_deref()
        .map(|s| parse_date(s, "start_date"))
        .transpose()?;
    let end = query
        .end_date
        .as_deref()
        .map(|s| parse_date(s, "end_date"))
        .transpose()?;

    let days = state.services.visits.list(start, end).await?;
    Ok(Json(days))
}

/// Get total visits over a date range
#[utoipa::path(
    get,
    path = "/visits/total",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(VisitQuery),
    responses(
        (status = 200, description = "Summed total over the range", body = VisitTotalResponse)
    )
)]
pub async fn get_total(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<VisitTotalResponse>> {
    claims.require_staff()?;

    let start = query
        .start_date
        .as_deref()
        .ok_or_else(|| AppError::Validation("start_date is required".to_string()))
        .and_then(|s| parse_date(s, "start_date"))?;
    let end = query
        .end_date
        .as_deref()
        .ok_or_else(|| AppError::Validation("end_date is required".to_string()))
        .and_then(|s| parse_date(s, "end_date"))?;

    if end < start {
        return Err(AppError::Validation(
            "end_date must not precede start_date".to_string(),
        ));
    }

    let total = state.services.visits.total(start, end).await?;
    Ok(Json(VisitTotalResponse {
        start_date: start,
        end_date: end,
        total,
    }))
}

/// Get one day's visit aggregate
#[utoipa::path(
    get,
    path = "/visits/{date}",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("date" = String, Path, description = "Day (YYYY-MM-DD)")),
    responses(
        (status = 200, description = "The day's aggregate", body = DailyVisitAggregate),
        (status = 404, description = "No visits recorded for that day")
    )
)]
pub async fn get_day(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(date): Path<String>,
) -> AppResult<Json<DailyVisitAggregate>> {
    claims.require_staff()?;

    let day = parse_date(&date, "date")?;
    let aggregate = state
        .services
        .visits
        .get_day(day)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No visits recorded for {}", day)))?;

    Ok(Json(aggregate))
}

/// List the detail rows backing one day's aggregate
#[utoipa::path(
    get,
    path = "/visits/{date}/details",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("date" = String, Path, description = "Day (YYYY-MM-DD)")),
    responses(
        (status = 200, description = "Detail rows for the day", body = Vec<VisitDetail>)
    )
)]
pub async fn list_day_details(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(date): Path<String>,
) -> AppResult<Json<Vec<VisitDetail>>> {
    claims.require_admin()?;

    let day = parse_date(&date, "date")?;
    let details = state.services.visits.details(day).await?;
    Ok(Json(details))
}

/// Purge one day's visit data (maintenance)
#[utoipa::path(
    delete,
    path = "/visits/{date}",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("date" = String, Path, description = "Day (YYYY-MM-DD)")),
    responses(
        (status = 204, description = "Day purged")
    )
)]
pub async fn purge_day(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(date): Path<String>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    let day = parse_date(&date, "date")?;
    let removed = state.services.visits.purge_day(day).await?;
    tracing::info!(day = %day, removed, "Purged visit data");
    Ok(StatusCode::NO_CONTENT)
}
