use axum::Router;
use axum::http::{Method, header};
use axum::routing::{get, post};
use shared::llm::FallbackDispatcher;
use tower_http::cors::{Any, CorsLayer};

mod chat;
mod errors;
mod health;


pub const CHAT_PATH: &str = "/api/chat";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: FallbackDispatcher,
    /// Applied to requests that do not set `generationConfig.maxOutputTokens`.
    pub max_output_tokens: u32,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route(CHAT_PATH, post(chat::generate))
        .layer(cors_layer())
        .with_state(app_state)
}

/// Any `OPTIONS` request is answered here as a preflight.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
