use std::path::PathBuf;

use thiserror::Error;

use crate::config_env::{
    optional_trimmed_env, parse_http_url_env, parse_list_env, parse_u32_env, parse_u64_env,
};
use crate::llm::{CredentialPool, ModelCandidateList};

/// Env vars consulted, in order, when building the credential pool.
pub const CREDENTIAL_ENV_VARS: [&str; 5] = [
    "GEMINI_API_KEY",
    "GEMINI_API_KEY_2",
    "GEMINI_API_KEY_3",
    "GEMINI_API_KEY_4",
    "GEMINI_API_KEY_5",
];

pub const DEFAULT_MODEL_CANDIDATES: [&str; 3] =
    ["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-flash-8b"];

const DEFAULT_PROXY_BIND_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_UPSTREAM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

const DEFAULT_CLIENT_PROXY_URL: &str = "http://127.0.0.1:8787/api/chat";
const DEFAULT_CLIENT_DATA_DIR: &str = "chat-data";
const DEFAULT_CLIENT_REQUEST_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub bind_addr: String,
    pub credentials: CredentialPool,
    pub model_candidates: ModelCandidateList,
    pub upstream_base_url: String,
    pub attempt_timeout_ms: u64,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub proxy_url: String,
    pub data_dir: PathBuf,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ProxyConfig {
    /// Reads the proxy settings from the environment.
    ///
    /// An empty credential pool is not an error here: the proxy still starts
    /// and every request fails with the configuration error instead.
    pub fn from_env() -> Result<Self, ConfigError> {
        let credentials = CredentialPool::from_values(
            CREDENTIAL_ENV_VARS
                .iter()
                .filter_map(|key| optional_trimmed_env(key)),
        );

        let model_candidates = ModelCandidateList::new(parse_list_env(
            "GEMINI_MODEL_CANDIDATES",
            &DEFAULT_MODEL_CANDIDATES,
        ));

        let attempt_timeout_ms =
            parse_u64_env("PROXY_ATTEMPT_TIMEOUT_MS", DEFAULT_ATTEMPT_TIMEOUT_MS)?;
        if attempt_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "PROXY_ATTEMPT_TIMEOUT_MS must be > 0".to_string(),
            ));
        }

        Ok(Self {
            bind_addr: optional_trimmed_env("PROXY_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_PROXY_BIND_ADDR.to_string()),
            credentials,
            model_candidates,
            upstream_base_url: parse_http_url_env(
                "GEMINI_API_BASE_URL",
                DEFAULT_UPSTREAM_BASE_URL,
            )?,
            attempt_timeout_ms,
            max_output_tokens: parse_u32_env(
                "PROXY_MAX_OUTPUT_TOKENS",
                DEFAULT_MAX_OUTPUT_TOKENS,
            )?,
        })
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            proxy_url: parse_http_url_env("CHAT_PROXY_URL", DEFAULT_CLIENT_PROXY_URL)?,
            data_dir: optional_trimmed_env("CHAT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CLIENT_DATA_DIR)),
            request_timeout_ms: parse_u64_env(
                "CHAT_REQUEST_TIMEOUT_MS",
                DEFAULT_CLIENT_REQUEST_TIMEOUT_MS,
            )?,
        })
    }
}
