use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use api_server::http::{AppState, build_router};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use shared::llm::{
    CredentialPool, FallbackDispatcher, GeminiGateway, GeminiGatewayConfig, ModelCandidateList,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// An axum app served on an ephemeral localhost port for the life of the value.
pub struct MockServer {
    pub base_url: String,
    serve_task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(app: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral port should bind");
        let base_url = format!(
            "http://{}",
            listener.local_addr().expect("bound port should resolve")
        );
        let serve_task = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                panic!("test server stopped: {err}");
            }
        });

        Self {
            base_url,
            serve_task,
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.serve_task.abort();
    }
}

/// Scripted upstream: each model answers with a fixed status and body.
#[derive(Clone, Default)]
pub struct UpstreamScript {
    replies: Arc<Mutex<HashMap<String, (StatusCode, Value)>>>,
    seen_models: Arc<Mutex<Vec<String>>>,
}

impl UpstreamScript {
    pub fn reply(self, model: &str, status: StatusCode, body: Value) -> Self {
        self.replies
            .lock()
            .expect("script lock should not be poisoned")
            .insert(model.to_string(), (status, body));
        self
    }

    pub fn seen_models(&self) -> Vec<String> {
        self.seen_models
            .lock()
            .expect("script lock should not be poisoned")
            .clone()
    }

    pub async fn serve(&self) -> MockServer {
        let app = Router::new()
            .route("/v1beta/models/{model_action}", post(scripted_generate))
            .with_state(self.clone());
        MockServer::start(app).await
    }
}

async fn scripted_generate(
    State(script): State<UpstreamScript>,
    Path(model_action): Path<String>,
) -> (StatusCode, Json<Value>) {
    let model = model_action
        .strip_suffix(":generateContent")
        .unwrap_or(&model_action)
        .to_string();
    script
        .seen_models
        .lock()
        .expect("script lock should not be poisoned")
        .push(model.clone());

    let reply = script
        .replies
        .lock()
        .expect("script lock should not be poisoned")
        .get(&model)
        .cloned();
    match reply {
        Some((status, body)) => (status, Json(body)),
        None => (
            StatusCode::NOT_FOUND,
            Json(upstream_error(404, "NOT_FOUND", &format!("models/{model} is not found"))),
        ),
    }
}

pub fn generation_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

pub fn upstream_error(code: u16, status: &str, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message, "status": status } })
}

/// Starts the real proxy router wired to a Gemini gateway aimed at `upstream`.
pub async fn spawn_proxy(upstream: &MockServer, keys: &[&str], models: &[&str]) -> MockServer {
    let gateway = GeminiGateway::new(GeminiGatewayConfig {
        base_url: format!("{}/v1beta", upstream.base_url),
        attempt_timeout_ms: 5_000,
    })
    .expect("gateway should build");

    let app = build_router(AppState {
        dispatcher: FallbackDispatcher::new(
            Arc::new(gateway),
            CredentialPool::from_values(keys.iter().copied()),
            ModelCandidateList::new(models.iter().copied()),
        ),
        max_output_tokens: 1024,
    });
    MockServer::start(app).await
}
