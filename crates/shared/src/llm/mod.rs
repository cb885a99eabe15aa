pub mod context;
pub mod credentials;
pub mod dispatch;
pub mod gateway;
pub mod gemini;

pub use context::{CONTEXT_WINDOW_MESSAGES, assemble_context, context_window};
pub use credentials::{Credential, CredentialError, CredentialPool, select_credential};
pub use dispatch::{
    AttemptFailure, DispatchError, DispatchResult, FallbackDispatcher, ModelCandidateList,
    dispatch,
};
pub use gateway::{
    AttemptError, AttemptErrorKind, Content, GenerateRequest, GenerationConfig, InlineData, Part,
    UpstreamFuture, UpstreamGateway,
};
pub use gemini::{GeminiGateway, GeminiGatewayConfig, GeminiGatewayError};
