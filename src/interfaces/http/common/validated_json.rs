//! Validated JSON extractor
//!
//! `ValidatedJson<T>` deserializes like `axum::Json<T>` and then runs
//! `validator::Validate::validate()`. Body rejections become 400, field
//! rule violations become 422, both inside the `ApiResponse` envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::ApiResponse;

/// JSON body that has passed its `Validate` rules.
///
/// ```ignore
/// async fn park_vehicle(ValidatedJson(body): ValidatedJson<ParkVehicleRequest>) { .. }
/// ```
pub struct ValidatedJson<T>(pub T);

pub enum ValidatedJsonRejection {
    /// Missing content type, malformed JSON or a field of the wrong shape
    JsonError(JsonRejection),
    ValidationError(validator::ValidationErrors),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        match self {
            Self::JsonError(rejection) => {
                let body = ApiResponse::<()>::error(format!(
                    "Invalid request body: {}",
                    rejection.body_text()
                ));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::ValidationError(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errs)| {
                        errs.iter().map(move |e| {
                            let msg = e
                                .message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| format!("{:?}", e.code));
                            format!("{}: {}", field, msg)
                        })
                    })
                    .collect();

                let message = if field_errors.is_empty() {
                    "Validation failed".to_string()
                } else {
                    field_errors.join("; ")
                };

                let body = ApiResponse::<()>::error(message);
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
        }
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(
        req: axum::extract::Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonError)?;

        value
            .validate()
            .map_err(ValidatedJsonRejection::ValidationError)?;

        Ok(ValidatedJson(value))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Debug, Deserialize, Validate)]
    struct PlateBody {
        #[validate(length(min = 1, max = 8))]
        plate: String,
        #[validate(range(min = 1, max = 3))]
        spots: u32,
    }

    async fn handler(ValidatedJson(_body): ValidatedJson<PlateBody>) -> &'static str {
        "ok"
    }

    async fn send(body: Body) -> axum::http::Response<Body> {
        use tower::Service;
        let req = Request::builder()
            .method("POST")
            .uri("/plates")
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let mut svc = Router::new().route("/plates", post(handler)).into_service();
        svc.call(req).await.unwrap()
    }

    #[tokio::test]
    async fn valid_body_returns_ok() {
        let resp = send(Body::from(r#"{"plate": "AB-12", "spots": 3}"#)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_returns_400() {
        let resp = send(Body::from("{plate")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_field_returns_400() {
        let resp = send(Body::from(r#"{"plate": "AB-12"}"#)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rule_violation_returns_422_with_field_names() {
        let resp = send(Body::from(r#"{"plate": "", "spots": 4}"#)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("plate"));
        assert!(error.contains("spots"));
    }
}
