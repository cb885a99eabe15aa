use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::llm::GenerateRequest;
use tracing::{error, warn};

use super::AppState;
use super::errors::{bad_request_response, generation_failed_response};

/// Forwards the conversation upstream and relays the first successful
/// payload verbatim.
pub(super) async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("rejected generation request body: {rejection}");
            return bad_request_response(&rejection.body_text());
        }
    };

    if request.contents.is_empty() {
        return bad_request_response("contents must not be empty");
    }

    let request = request.with_default_max_output_tokens(state.max_output_tokens);

    match state.dispatcher.handle(&request).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(err) => {
            error!(error_type = err.error_type(), "generation request failed: {err}");
            generation_failed_response(&err.to_string())
        }
    }
}
