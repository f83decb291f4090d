//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::ParkingLotService;
use crate::domain::LotStore;

use super::common::ApiResponse;
use super::modules::health::{self, HealthState};
use super::modules::metrics::http_metrics_middleware;
use super::modules::parking::{self, ParkingState};
use super::modules::request_id::request_id_middleware;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Parking
        parking::park_vehicle,
        parking::leave_lot,
        parking::remaining_spots,
        parking::is_full,
        parking::occupancy,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            parking::ParkVehicleRequest,
            parking::ParkingTicketDto,
            parking::LeaveResponse,
            parking::RemainingSpotsResponse,
            parking::IsFullResponse,
            parking::SpotOccupancyDto,
        )
    ),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Parking", description = "Park and unpark vehicles, query free capacity"),
    ),
    info(
        title = "Parking Lot API",
        version = "1.0.0",
        description = "Spot allocation for motorcycles, cars and vans",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// `GET /metrics` in Prometheus text format
async fn prometheus_metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}

/// Create the API router with all routes
///
/// `prometheus` is `None` when no recorder is installed; `/metrics` is then
/// not mounted.
pub fn create_api_router(
    service: Arc<ParkingLotService>,
    store: Arc<dyn LotStore>,
    prometheus: Option<PrometheusHandle>,
) -> Router {
    let parking_routes = Router::new()
        .route("/park", post(parking::park_vehicle))
        .route("/leave/{vehicle_id}", post(parking::leave_lot))
        .route("/remaining-spots", get(parking::remaining_spots))
        .route("/occupancy", get(parking::occupancy))
        .route("/{vehicle_type}/is-full", get(parking::is_full))
        .with_state(ParkingState { service });

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(HealthState {
            store,
            started_at: Arc::new(Instant::now()),
        });

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    let mut router = Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .nest("/api/v1/parking-lot", parking_routes);

    if let Some(handle) = prometheus {
        router = router.merge(
            Router::new()
                .route("/metrics", get(prometheus_metrics))
                .with_state(handle),
        );
    }

    router
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
