//! Shared HTTP plumbing: response envelope, error mapping and extractors

pub mod validated_json;

pub use validated_json::ValidatedJson;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Standard API response envelope
///
/// Every REST endpoint wraps its payload in this envelope.
/// On success: `{"success": true, "data": {...}}`,
/// on failure: `{"success": false, "data": null, "error": "description"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// `true` if the request succeeded
    pub success: bool,
    /// Payload. `null` on error
    pub data: Option<T>,
    /// Error description. Omitted on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

/// HTTP status for a domain error
pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        e if e.is_conflict() => StatusCode::CONFLICT,
        DomainError::VehicleNotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        // Lost races that survived every retry: the client may try again.
        e if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn domain_error(error: DomainError) -> ApiError {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!(error = %error, "Request failed");
    }
    (status, Json(ApiResponse::error(error.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VehicleType;

    #[test]
    fn business_rejections_are_conflicts() {
        assert_eq!(
            status_for(&DomainError::AlreadyParked("A".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&DomainError::NoAvailableSpots(VehicleType::Car)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&DomainError::VehicleNotFound("A".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn infrastructure_failures_are_server_errors() {
        assert_eq!(
            status_for(&DomainError::Conflict("busy".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&DomainError::Storage("io".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn only_business_conflicts_map_to_409() {
        let errors = [
            DomainError::AlreadyParked("A".into()),
            DomainError::NoAvailableSpots(VehicleType::Van),
            DomainError::VehicleNotFound("A".into()),
            DomainError::Validation("empty".into()),
            DomainError::Conflict("busy".into()),
            DomainError::Storage("io".into()),
        ];
        for error in &errors {
            assert_eq!(
                status_for(error) == StatusCode::CONFLICT,
                error.is_conflict(),
                "{error}"
            );
        }
    }

    #[test]
    fn error_envelope_has_no_data() {
        let (_, Json(body)) = domain_error(DomainError::VehicleNotFound("X".into()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert_eq!(json["error"], "Vehicle X not found");
    }
}
