use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::models::ErrorResponse;

pub(super) fn bad_request_response(message: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

/// Configuration failures and exhausted fallbacks both surface as 500.
pub(super) fn generation_failed_response(message: &str) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}
