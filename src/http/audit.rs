//! Rejection auditing.
//!
//! Every response with status >= 400 becomes exactly one security event.
//! Recording is best-effort and can never change the client's response,
//! except that production hides 500 details behind a generic message.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::http::error::{ErrorBody, Rejection};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::store::SecurityEventKind;

const GENERIC_INTERNAL_ERROR: &str = "Internal server error.";

pub async fn audit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let status = response.status();
    metrics::record_request(method.as_str(), status.as_u16(), start);

    if status.as_u16() < 400 {
        return response;
    }

    let (kind, message) = match response.extensions().get::<Rejection>() {
        Some(rejection) => (rejection.kind, rejection.message.clone()),
        None => (
            SecurityEventKind::HttpError,
            status.canonical_reason().unwrap_or("HTTP error").to_string(),
        ),
    };

    let details = serde_json::json!({
        "statusCode": status.as_u16(),
        "path": path,
        "method": method.as_str(),
        "message": message,
    });
    state
        .events
        .record_security_event(kind, Some(details.to_string()))
        .await;

    if status == StatusCode::INTERNAL_SERVER_ERROR && state.config.is_production() {
        return generic_internal_error(response);
    }
    response
}

/// Replace the body, keep the headers that were already set.
fn generic_internal_error(response: Response) -> Response {
    let (mut parts, _) = response.into_parts();
    let replacement = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: GENERIC_INTERNAL_ERROR.to_string(),
        }),
    )
        .into_response();
    let (new_parts, body) = replacement.into_parts();
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    parts.headers.extend(new_parts.headers);
    Response::from_parts(parts, body)
}
