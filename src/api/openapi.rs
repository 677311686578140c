//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, visits};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Presença API",
        version = "1.0.0",
        description = "Congregation Visit Analytics REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Visits
        visits::track_visit,
        visits::list_visits,
        visits::get_total,
        visits::get_day,
        visits::list_day_details,
        visits::purge_day,
    ),
    components(
        schemas(
            // Visits
            crate::models::visit::Role,
            crate::models::visit::VisitDetail,
            crate::models::visit::RoleCounts,
            crate::models::visit::DailyVisitAggregate,
            crate::models::visit::TrackVisitRequest,
            crate::models::visit::TrackVisitResponse,
            crate::models::visit::VisitQuery,
            crate::models::visit::VisitTotalResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "visits", description = "Visit tracking and daily aggregates")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
