use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::credentials::Credential;
use super::gateway::{AttemptError, GenerateRequest, UpstreamFuture, UpstreamGateway};

const QUOTA_EXHAUSTED_STATUS: &str = "RESOURCE_EXHAUSTED";
const NOT_FOUND_STATUS: &str = "NOT_FOUND";
const MAX_DIAGNOSTIC_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct GeminiGatewayConfig {
    /// e.g. `https://generativelanguage.googleapis.com/v1beta`, no trailing slash.
    pub base_url: String,
    pub attempt_timeout_ms: u64,
}

#[derive(Debug, Error)]
pub enum GeminiGatewayError {
    #[error("failed to build upstream http client: {0}")]
    HttpClient(String),
}

#[derive(Clone)]
pub struct GeminiGateway {
    client: reqwest::Client,
    config: GeminiGatewayConfig,
}

impl GeminiGateway {
    pub fn new(config: GeminiGatewayConfig) -> Result<Self, GeminiGatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.attempt_timeout_ms))
            .build()
            .map_err(|err| GeminiGatewayError::HttpClient(err.to_string()))?;

        Ok(Self { client, config })
    }

    fn endpoint_for(&self, model: &str) -> String {
        format!(
            "{}/models/{model}:generateContent",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn send_once(
        &self,
        model: &str,
        credential: &Credential,
        request: &GenerateRequest,
    ) -> Result<Value, AttemptError> {
        let response = self
            .client
            .post(self.endpoint_for(model))
            .query(&[("key", credential.expose())])
            .json(request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    AttemptError::transient("upstream request timed out")
                } else {
                    // The key travels in the query string; keep it out of diagnostics.
                    AttemptError::transient(format!(
                        "upstream request failed: {}",
                        err.without_url()
                    ))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            AttemptError::transient(format!(
                "failed to read upstream response body: {}",
                err.without_url()
            ))
        })?;

        let parsed = serde_json::from_str::<Value>(&body);

        if !status.is_success() {
            let details = parsed.ok().as_ref().and_then(upstream_error_details);
            return Err(classify_failure(status, details));
        }

        let payload = parsed.map_err(|_| {
            AttemptError::transient(format!(
                "upstream returned a non-JSON body (status {})",
                status.as_u16()
            ))
        })?;

        // Some gateways answer 200 with an error envelope.
        if let Some(details) = upstream_error_details(&payload) {
            return Err(classify_failure(status, Some(details)));
        }

        Ok(payload)
    }
}

impl UpstreamGateway for GeminiGateway {
    fn generate<'a>(
        &'a self,
        model: &'a str,
        credential: &'a Credential,
        request: &'a GenerateRequest,
    ) -> UpstreamFuture<'a> {
        Box::pin(self.send_once(model, credential, request))
    }
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamErrorDetails {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

fn upstream_error_details(value: &Value) -> Option<UpstreamErrorDetails> {
    value
        .get("error")
        .and_then(|error| UpstreamErrorDetails::deserialize(error).ok())
}

fn classify_failure(status: StatusCode, details: Option<UpstreamErrorDetails>) -> AttemptError {
    let details = details.unwrap_or_default();
    let upstream_status = details.status.as_deref().unwrap_or_default();
    let diagnostic = diagnostic_message(status, &details);

    if status == StatusCode::TOO_MANY_REQUESTS
        || details.code == Some(StatusCode::TOO_MANY_REQUESTS.as_u16())
        || upstream_status == QUOTA_EXHAUSTED_STATUS
    {
        return AttemptError::quota_exceeded(diagnostic);
    }

    if status == StatusCode::NOT_FOUND
        || details.code == Some(StatusCode::NOT_FOUND.as_u16())
        || upstream_status == NOT_FOUND_STATUS
    {
        return AttemptError::model_unavailable(diagnostic);
    }

    AttemptError::transient(diagnostic)
}

fn diagnostic_message(status: StatusCode, details: &UpstreamErrorDetails) -> String {
    match details
        .message
        .as_deref()
        .map(str::trim)
        .filter(|message| !message.is_empty())
    {
        Some(message) => message.chars().take(MAX_DIAGNOSTIC_CHARS).collect(),
        None => format!("upstream returned status {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm::gateway::AttemptErrorKind;

    fn details(body: Value) -> Option<UpstreamErrorDetails> {
        upstream_error_details(&body)
    }

    #[test]
    fn rate_limit_status_classifies_as_quota() {
        let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, None);

        assert_eq!(err.kind, AttemptErrorKind::QuotaExceeded);
        assert_eq!(err.diagnostic, "upstream returned status 429");
    }

    #[test]
    fn resource_exhausted_body_classifies_as_quota_even_on_other_status() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            details(json!({
                "error": {
                    "code": 400,
                    "message": "Quota exceeded for metric",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })),
        );

        assert_eq!(err.kind, AttemptErrorKind::QuotaExceeded);
        assert_eq!(err.diagnostic, "Quota exceeded for metric");
    }

    #[test]
    fn not_found_classifies_as_model_unavailable() {
        let err = classify_failure(
            StatusCode::NOT_FOUND,
            details(json!({
                "error": {
                    "code": 404,
                    "message": "models/gemini-old is not found",
                    "status": "NOT_FOUND"
                }
            })),
        );

        assert_eq!(err.kind, AttemptErrorKind::ModelUnavailable);
        assert_eq!(err.diagnostic, "models/gemini-old is not found");
    }

    #[test]
    fn other_failures_are_transient() {
        let err = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, details(json!("oops")));

        assert_eq!(err.kind, AttemptErrorKind::TransientError);
        assert_eq!(err.diagnostic, "upstream returned status 500");
    }

    #[test]
    fn endpoint_includes_model_and_trims_trailing_slash() {
        let gateway = GeminiGateway::new(GeminiGatewayConfig {
            base_url: "http://127.0.0.1:9/v1beta/".to_string(),
            attempt_timeout_ms: 1_000,
        })
        .expect("gateway should build");

        assert_eq!(
            gateway.endpoint_for("gemini-2.0-flash"),
            "http://127.0.0.1:9/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
