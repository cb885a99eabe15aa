use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::credentials::Credential;

pub type UpstreamFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Value, AttemptError>> + Send + 'a>>;

/// Body of a generation call, in the upstream `generateContent` wire shape.
///
/// The proxy accepts this from clients and forwards it unchanged apart from
/// the default output limit. Keys without a typed field (`safetySettings`,
/// `tools`, `fileData` parts, `topP`, ...) ride along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(
        default,
        alias = "system_instruction",
        skip_serializing_if = "Option::is_none"
    )]
    pub system_instruction: Option<Content>,
    #[serde(
        default,
        alias = "generation_config",
        skip_serializing_if = "Option::is_none"
    )]
    pub generation_config: Option<GenerationConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        alias = "inline_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineData>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(alias = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(
        default,
        alias = "max_output_tokens",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenerateRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user_text(prompt)],
            system_instruction: None,
            generation_config: None,
            extra: Map::new(),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        let instruction = instruction.into();
        if !instruction.trim().is_empty() {
            self.system_instruction = Some(Content {
                role: None,
                parts: vec![Part::text(instruction)],
                extra: Map::new(),
            });
        }
        self
    }

    /// Fills `maxOutputTokens` when the caller did not pick one.
    pub fn with_default_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        let config = self.generation_config.get_or_insert_with(Default::default);
        if config.max_output_tokens.is_none() {
            config.max_output_tokens = Some(max_output_tokens);
        }
        self
    }
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
            extra: Map::new(),
        }
    }
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
            extra: Map::new(),
        }
    }
}

/// How a single model attempt failed. Every kind lets the dispatcher move on
/// to the next candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptErrorKind {
    QuotaExceeded,
    ModelUnavailable,
    TransientError,
}

impl AttemptErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuotaExceeded => "quota_exceeded",
            Self::ModelUnavailable => "model_unavailable",
            Self::TransientError => "transient_error",
        }
    }
}

impl fmt::Display for AttemptErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptError {
    pub kind: AttemptErrorKind,
    pub diagnostic: String,
}

impl AttemptError {
    pub fn quota_exceeded(diagnostic: impl Into<String>) -> Self {
        Self {
            kind: AttemptErrorKind::QuotaExceeded,
            diagnostic: diagnostic.into(),
        }
    }

    pub fn model_unavailable(diagnostic: impl Into<String>) -> Self {
        Self {
            kind: AttemptErrorKind::ModelUnavailable,
            diagnostic: diagnostic.into(),
        }
    }

    pub fn transient(diagnostic: impl Into<String>) -> Self {
        Self {
            kind: AttemptErrorKind::TransientError,
            diagnostic: diagnostic.into(),
        }
    }
}

/// One outbound generation call against one model identifier.
pub trait UpstreamGateway: Send + Sync {
    fn generate<'a>(
        &'a self,
        model: &'a str,
        credential: &'a Credential,
        request: &'a GenerateRequest,
    ) -> UpstreamFuture<'a>;
}
