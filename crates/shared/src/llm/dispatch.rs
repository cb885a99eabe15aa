use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::credentials::{Credential, CredentialError, CredentialPool, select_credential};
use super::gateway::{AttemptErrorKind, GenerateRequest, UpstreamGateway};

/// Model identifiers in fallback order, highest priority first.
///
/// Duplicates are dropped keeping the first occurrence, so one dispatch never
/// calls the same model twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCandidateList {
    models: Vec<String>,
}

impl ModelCandidateList {
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for model in models {
            let model = model.as_ref().trim();
            if !model.is_empty() && !deduped.iter().any(|seen| seen == model) {
                deduped.push(model.to_string());
            }
        }

        Self { models: deduped }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.models
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub model: String,
    pub kind: AttemptErrorKind,
    pub diagnostic: String,
}

pub type DispatchResult = Result<Value, DispatchError>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Configuration(#[from] CredentialError),
    #[error("no model candidates configured")]
    NoCandidates,
    /// Every candidate failed. Only the last diagnostic is surfaced; the full
    /// list is kept for logging.
    #[error("{last_diagnostic}")]
    Exhausted {
        last_diagnostic: String,
        attempts: Vec<AttemptFailure>,
    },
}

impl DispatchError {
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration(_) | Self::NoCandidates => "configuration_error",
            Self::Exhausted { .. } => "exhaustion_error",
        }
    }
}

/// Tries each candidate once, in order, and returns the first success.
pub async fn dispatch(
    gateway: &dyn UpstreamGateway,
    request: &GenerateRequest,
    credential: &Credential,
    candidates: &ModelCandidateList,
) -> DispatchResult {
    let mut attempts: Vec<AttemptFailure> = Vec::new();

    for model in candidates.iter() {
        debug!(model = %model, "attempting upstream generation");
        match gateway.generate(model, credential, request).await {
            Ok(payload) => {
                info!(
                    model = %model,
                    failed_attempts = attempts.len(),
                    "upstream generation succeeded"
                );
                return Ok(payload);
            }
            Err(err) => {
                warn!(
                    model = %model,
                    kind = %err.kind,
                    diagnostic = %err.diagnostic,
                    "upstream attempt failed; trying next candidate"
                );
                attempts.push(AttemptFailure {
                    model: model.to_string(),
                    kind: err.kind,
                    diagnostic: err.diagnostic,
                });
            }
        }
    }

    match attempts.last() {
        Some(last) => Err(DispatchError::Exhausted {
            last_diagnostic: last.diagnostic.clone(),
            attempts,
        }),
        None => Err(DispatchError::NoCandidates),
    }
}

/// Credential selection plus model fallback behind one call.
#[derive(Clone)]
pub struct FallbackDispatcher {
    gateway: Arc<dyn UpstreamGateway>,
    credentials: CredentialPool,
    candidates: ModelCandidateList,
}

impl FallbackDispatcher {
    pub fn new(
        gateway: Arc<dyn UpstreamGateway>,
        credentials: CredentialPool,
        candidates: ModelCandidateList,
    ) -> Self {
        Self {
            gateway,
            credentials,
            candidates,
        }
    }

    pub async fn handle(&self, request: &GenerateRequest) -> DispatchResult {
        let credential = select_credential(&self.credentials)?;
        let result = dispatch(self.gateway.as_ref(), request, credential, &self.candidates).await;

        if let Err(DispatchError::Exhausted { attempts, .. }) = &result {
            warn!(
                attempted_models = attempts.len(),
                "all model candidates failed"
            );
        }

        result
    }
}
