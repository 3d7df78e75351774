//! Axum Middleware for HTTP Request Tracing
//!
//! Every request gets a correlation id (taken from `x-request-id` or freshly
//! minted), a tracing span, and a completion log line.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::constants::{MAX_ID_LENGTH, REQUEST_ID_HEADER};

/// Correlation id stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Collapse path segments that carry identifiers so spans stay low-cardinality.
fn normalize_path(path: &str) -> String {
    let mut normalized = Vec::new();
    let mut previous = "";
    for segment in path.split('/') {
        if matches!(previous, "players" | "treasures") && !segment.is_empty() {
            normalized.push("{id}");
        } else {
            normalized.push(segment);
        }
        previous = segment;
    }
    normalized.join("/")
}

fn incoming_request_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_ID_LENGTH)
        .map(str::to_string)
}

/// Observability middleware for Axum.
pub async fn observability_middleware(mut request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = normalize_path(&path);
    let request_id = incoming_request_id(&request).unwrap_or_else(|| Uuid::now_v7().to_string());
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.route = %route,
        request_id = %request_id,
    );

    let mut response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis(),
            request_id = %request_id,
            "Request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis(),
            request_id = %request_id,
            "Request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_player() {
        assert_eq!(
            normalize_path("/api/v1/admin/players/alice/reset"),
            "/api/v1/admin/players/{id}/reset"
        );
    }

    #[test]
    fn test_normalize_path_treasure_hint() {
        assert_eq!(
            normalize_path("/api/v1/treasures/clock-tower/hint"),
            "/api/v1/treasures/{id}/hint"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/treasures"), "/api/v1/treasures");
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
    }
}
