//! Parking lot handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    IsFullResponse, LeaveResponse, ParkVehicleRequest, ParkingTicketDto, RemainingSpotsResponse,
    SpotOccupancyDto,
};
use crate::application::ParkingLotService;
use crate::domain::VehicleType;
use crate::interfaces::http::common::{domain_error, ApiError, ApiResponse, ValidatedJson};

/// Parking handler state
#[derive(Clone)]
pub struct ParkingState {
    pub service: Arc<ParkingLotService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/parking-lot/park",
    tag = "Parking",
    request_body = ParkVehicleRequest,
    responses(
        (status = 201, description = "Vehicle parked", body = ApiResponse<ParkingTicketDto>),
        (status = 400, description = "Malformed request"),
        (status = 409, description = "Already parked or no available spots"),
        (status = 422, description = "Validation error"),
        (status = 503, description = "Lot busy, retry later")
    )
)]
pub async fn park_vehicle(
    State(state): State<ParkingState>,
    ValidatedJson(request): ValidatedJson<ParkVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ParkingTicketDto>>), ApiError> {
    let ticket = state
        .service
        .park(&request.id, request.vehicle_type)
        .await
        .map_err(domain_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ParkingTicketDto::from(ticket))),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/parking-lot/leave/{vehicle_id}",
    tag = "Parking",
    params(("vehicle_id" = String, Path, description = "Parked vehicle ID")),
    responses(
        (status = 200, description = "Vehicle left", body = ApiResponse<LeaveResponse>),
        (status = 404, description = "Vehicle not parked"),
        (status = 503, description = "Lot busy, retry later")
    )
)]
pub async fn leave_lot(
    State(state): State<ParkingState>,
    Path(vehicle_id): Path<String>,
) -> Result<Json<ApiResponse<LeaveResponse>>, ApiError> {
    let released = state
        .service
        .leave(&vehicle_id)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(LeaveResponse {
        vehicle_id,
        released_spot_ids: released,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/parking-lot/remaining-spots",
    tag = "Parking",
    responses(
        (status = 200, description = "Free spots across all types", body = ApiResponse<RemainingSpotsResponse>)
    )
)]
pub async fn remaining_spots(
    State(state): State<ParkingState>,
) -> Result<Json<ApiResponse<RemainingSpotsResponse>>, ApiError> {
    let remaining = state
        .service
        .remaining_spots()
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(RemainingSpotsResponse {
        remaining_spots: remaining,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/parking-lot/{vehicle_type}/is-full",
    tag = "Parking",
    params(("vehicle_type" = String, Path, description = "MOTORCYCLE, CAR or VAN")),
    responses(
        (status = 200, description = "Whether a park of this type would be rejected", body = ApiResponse<IsFullResponse>),
        (status = 400, description = "Unknown vehicle type")
    )
)]
pub async fn is_full(
    State(state): State<ParkingState>,
    Path(vehicle_type): Path<String>,
) -> Result<Json<ApiResponse<IsFullResponse>>, ApiError> {
    let vehicle_type: VehicleType = vehicle_type.parse().map_err(domain_error)?;
    let full = state
        .service
        .is_full(vehicle_type)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(IsFullResponse {
        vehicle_type: vehicle_type.to_string(),
        is_full: full,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/parking-lot/occupancy",
    tag = "Parking",
    responses(
        (status = 200, description = "Occupancy per spot type", body = ApiResponse<Vec<SpotOccupancyDto>>)
    )
)]
pub async fn occupancy(
    State(state): State<ParkingState>,
) -> Result<Json<ApiResponse<Vec<SpotOccupancyDto>>>, ApiError> {
    let occupancy = state.service.occupancy().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        occupancy.into_iter().map(SpotOccupancyDto::from).collect(),
    )))
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use axum::Router;
    use serde_json::Value;

    use super::*;
    use crate::domain::{SpotType, VehicleTypePolicy};
    use crate::infrastructure::storage::InMemoryLotStore;

    fn app() -> Router {
        let store = Arc::new(InMemoryLotStore::with_spots(&[
            (SpotType::Motorcycle, 1),
            (SpotType::Compact, 1),
            (SpotType::Regular, 3),
        ]));
        let service = Arc::new(ParkingLotService::new(store, VehicleTypePolicy::standard()));
        Router::new()
            .route("/park", post(park_vehicle))
            .route("/leave/{vehicle_id}", post(leave_lot))
            .route("/remaining-spots", get(remaining_spots))
            .route("/occupancy", get(occupancy))
            .route("/{vehicle_type}/is-full", get(is_full))
            .with_state(ParkingState { service })
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        use tower::Service;
        let mut svc = app.clone().into_service();
        let resp = svc.call(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn park_req(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/park")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn park_as(id: &str, vehicle_type: &str) -> Request<Body> {
        park_req(serde_json::json!({"id": id, "type": vehicle_type}))
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn leave_req(id: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/leave/{id}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn park_returns_created_ticket() {
        let app = app();
        let (status, body) = send(&app, park_as("V1", "VAN")).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["vehicle_id"], "V1");
        assert_eq!(body["data"]["vehicle_type"], "VAN");
        assert_eq!(body["data"]["spot_ids"], serde_json::json!([3, 4, 5]));
    }

    #[tokio::test]
    async fn duplicate_park_is_conflict() {
        let app = app();
        send(&app, park_as("X", "MOTORCYCLE")).await;
        let (status, body) = send(&app, park_as("X", "CAR")).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Vehicle X is already parked");
    }

    #[tokio::test]
    async fn full_lot_is_conflict() {
        let app = app();
        send(&app, park_as("M1", "MOTORCYCLE")).await;
        let (status, body) = send(&app, park_as("M2", "MOTORCYCLE")).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "No available spots for MOTORCYCLE");
    }

    #[tokio::test]
    async fn unknown_type_and_missing_fields_are_bad_requests() {
        let app = app();
        let (status, _) = send(&app, park_as("T1", "TRUCK")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, park_req(serde_json::json!({"id": "T1"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, get_req("/TRUCK/is-full")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_and_overlong_ids_fail_validation() {
        let app = app();
        let (status, _) = send(&app, park_as("", "CAR")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let long = "x".repeat(65);
        let (status, _) = send(&app, park_as(&long, "CAR")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn leave_releases_spots_then_not_found() {
        let app = app();
        send(&app, park_as("C1", "CAR")).await;

        let (status, body) = send(&app, leave_req("C1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["released_spot_ids"], serde_json::json!([2]));

        let (status, body) = send(&app, leave_req("C1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn queries_reflect_parked_vehicles() {
        let app = app();
        let (_, body) = send(&app, get_req("/remaining-spots")).await;
        assert_eq!(body["data"]["remaining_spots"], 5);

        send(&app, park_as("V1", "VAN")).await;

        let (_, body) = send(&app, get_req("/remaining-spots")).await;
        assert_eq!(body["data"]["remaining_spots"], 2);

        let (status, body) = send(&app, get_req("/van/is-full")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["vehicle_type"], "VAN");
        assert_eq!(body["data"]["is_full"], true);

        let (_, body) = send(&app, get_req("/CAR/is-full")).await;
        assert_eq!(body["data"]["is_full"], false);

        let (_, body) = send(&app, get_req("/occupancy")).await;
        let regular = &body["data"][2];
        assert_eq!(regular["spot_type"], "REGULAR");
        assert_eq!(regular["occupied"], 3);
        assert_eq!(regular["free"], 0);
    }
}
