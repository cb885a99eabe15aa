use std::time::Duration;

use serde_json::Value;
use shared::config::ClientConfig;
use shared::llm::GenerateRequest;
use thiserror::Error;
use tracing::{debug, warn};

/// Shown when the proxy cannot be reached or answers with nothing usable.
pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't reach the assistant right now. Please try again in a moment.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build proxy http client: {0}")]
    HttpClient(String),
    #[error("proxy request failed: {0}")]
    Transport(String),
    #[error("proxy returned a non-json body (status {status})")]
    InvalidBody { status: u16 },
}

/// What the proxy answered, checked for an `error` field before it is read as
/// a generation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyReply {
    Generation(String),
    Error(String),
    Empty,
}

impl ProxyReply {
    pub fn from_body(body: &Value) -> Self {
        if let Some(message) = relayed_error(body) {
            return Self::Error(message);
        }

        match generation_text(body) {
            Some(text) => Self::Generation(text),
            None => Self::Empty,
        }
    }

    /// Text to display; an empty reply degrades to [`FALLBACK_REPLY`].
    pub fn into_text(self) -> String {
        match self {
            Self::Generation(text) | Self::Error(text) => text,
            Self::Empty => FALLBACK_REPLY.to_string(),
        }
    }
}

fn relayed_error(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    let message = match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => fields.get("message")?.as_str()?.to_string(),
        _ => return None,
    };

    let message = message.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

fn generation_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<String>();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[derive(Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    proxy_url: String,
}

impl ProxyClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|err| ClientError::HttpClient(err.to_string()))?;

        Ok(Self {
            client,
            proxy_url: config.proxy_url.clone(),
        })
    }

    pub fn proxy_url(&self) -> &str {
        &self.proxy_url
    }

    /// Posts the request and interprets the body whatever the status code.
    pub async fn post_generation(
        &self,
        request: &GenerateRequest,
    ) -> Result<ProxyReply, ClientError> {
        let response = self
            .client
            .post(&self.proxy_url)
            .json(request)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .map_err(|_| ClientError::InvalidBody { status })?;
        debug!(status, "proxy answered");

        Ok(ProxyReply::from_body(&body))
    }

    /// Like [`Self::post_generation`], but every failure becomes the fallback reply.
    pub async fn ask(&self, request: &GenerateRequest) -> String {
        match self.post_generation(request).await {
            Ok(reply) => reply.into_text(),
            Err(err) => {
                warn!("chat request failed: {err}");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FALLBACK_REPLY, ProxyReply};

    #[test]
    fn joins_all_text_parts_of_first_candidate() {
        let body = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Hello, " }, { "text": "Asha." }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        });

        assert_eq!(
            ProxyReply::from_body(&body),
            ProxyReply::Generation("Hello, Asha.".to_string())
        );
    }

    #[test]
    fn error_field_wins_over_candidates() {
        let body = json!({
            "error": "Quota exceeded",
            "candidates": [{ "content": { "parts": [{ "text": "stale" }] } }]
        });

        assert_eq!(
            ProxyReply::from_body(&body),
            ProxyReply::Error("Quota exceeded".to_string())
        );
    }

    #[test]
    fn upstream_error_object_is_relayed_by_message() {
        let body = json!({ "error": { "code": 400, "message": "API key not valid" } });

        assert_eq!(
            ProxyReply::from_body(&body).into_text(),
            "API key not valid".to_string()
        );
    }

    #[test]
    fn body_without_text_falls_back() {
        let blocked = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        let unrelated = json!({ "ok": true });

        assert_eq!(ProxyReply::from_body(&blocked), ProxyReply::Empty);
        assert_eq!(ProxyReply::from_body(&unrelated).into_text(), FALLBACK_REPLY);
    }
}
