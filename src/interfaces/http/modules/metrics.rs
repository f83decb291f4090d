//! Per-route HTTP request metrics

use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};

/// Route label for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Route template the request matched, e.g. `/api/v1/parking-lot/leave/{vehicle_id}`.
///
/// Raw URIs are never used as labels: a vehicle id in the path would create
/// one series per vehicle.
pub fn route_label<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_ROUTE.to_string(), |mp| mp.as_str().to_string())
}

/// Records `http_requests_total{method,route,status}` and
/// `http_request_duration_seconds{method,route}`.
pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let route = route_label(&request);

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.clone(),
        "route" => route.clone()
    )
    .record(elapsed);

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method,
        "route" => route,
        "status" => status
    )
    .increment(1);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrouted_requests_share_one_label() {
        let a = Request::builder()
            .uri("/api/v1/parking-lot/leave/V1/extra")
            .body(())
            .unwrap();
        let b = Request::builder().uri("/nope").body(()).unwrap();

        assert_eq!(route_label(&a), UNMATCHED_ROUTE);
        assert_eq!(route_label(&b), UNMATCHED_ROUTE);
    }
}
