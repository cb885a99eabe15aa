use std::net::SocketAddr;
use std::sync::Arc;

use api_server::http::{self, AppState};
use shared::config::ProxyConfig;
use shared::llm::{FallbackDispatcher, GeminiGateway, GeminiGatewayConfig};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "api_server=debug,shared=info,tower_http=info".to_string()),
        )
        .init();

    let config = match ProxyConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("failed to read config: {err}");
            std::process::exit(1);
        }
    };

    if config.credentials.is_empty() {
        warn!("no upstream credentials configured; every generation request will fail");
    }
    info!(
        credentials = config.credentials.len(),
        models = ?config.model_candidates.as_slice(),
        "upstream fallback configured"
    );

    let gateway = match GeminiGateway::new(GeminiGatewayConfig {
        base_url: config.upstream_base_url.clone(),
        attempt_timeout_ms: config.attempt_timeout_ms,
    }) {
        Ok(gateway) => gateway,
        Err(err) => {
            error!("failed to build upstream gateway: {err}");
            std::process::exit(1);
        }
    };

    let app = http::build_router(AppState {
        dispatcher: FallbackDispatcher::new(
            Arc::new(gateway),
            config.credentials,
            config.model_candidates,
        ),
        max_output_tokens: config.max_output_tokens,
    });

    let addr: SocketAddr = match config.bind_addr.parse() {
        Ok(addr) => addr,
        Err(err) => {
            error!("invalid PROXY_BIND_ADDR {}: {err}", config.bind_addr);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            std::process::exit(1);
        }
    };

    info!(
        "chat proxy listening on {}",
        listener.local_addr().unwrap_or(addr)
    );

    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        let _ = signal::ctrl_c().await;
        info!("shutdown signal received");
    });

    if let Err(err) = server.await {
        error!("server error: {err}");
        std::process::exit(1);
    }
}
