use std::io;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{ConversationSession, UserProfile};

mod file_store;
mod memory_store;

pub use file_store::JsonFileStore;
pub use memory_store::MemoryStore;

/// Fixed blob key holding the user profile.
pub const PROFILE_KEY: &str = "user_profile";
/// Fixed blob key holding every conversation session.
pub const SESSIONS_KEY: &str = "chat_sessions";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid persisted data under {key}: {message}")]
    InvalidData { key: String, message: String },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Key-value backend holding serialized JSON blobs, read and written whole.
pub trait BlobStore: Send + Sync {
    fn read_blob(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write_blob(&self, key: &str, contents: &str) -> Result<(), StoreError>;
}

pub trait SessionRepository: Send + Sync {
    fn load_sessions(&self) -> Result<Vec<ConversationSession>, StoreError>;
    fn save_sessions(&self, sessions: &[ConversationSession]) -> Result<(), StoreError>;
}

pub trait ProfileRepository: Send + Sync {
    fn load_profile(&self) -> Result<Option<UserProfile>, StoreError>;
    fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError>;
}

impl<T: BlobStore> SessionRepository for T {
    fn load_sessions(&self) -> Result<Vec<ConversationSession>, StoreError> {
        Ok(read_json(self, SESSIONS_KEY)?.unwrap_or_default())
    }

    fn save_sessions(&self, sessions: &[ConversationSession]) -> Result<(), StoreError> {
        write_json(self, SESSIONS_KEY, &sessions)
    }
}

impl<T: BlobStore> ProfileRepository for T {
    fn load_profile(&self) -> Result<Option<UserProfile>, StoreError> {
        read_json(self, PROFILE_KEY)
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        write_json(self, PROFILE_KEY, profile)
    }
}

fn read_json<S, T>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    S: BlobStore + ?Sized,
    T: DeserializeOwned,
{
    let Some(raw) = store.read_blob(key)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| StoreError::InvalidData {
            key: key.to_string(),
            message: err.to_string(),
        })
}

fn write_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: BlobStore + ?Sized,
    T: Serialize + ?Sized,
{
    let encoded = serde_json::to_string(value).map_err(|err| StoreError::InvalidData {
        key: key.to_string(),
        message: err.to_string(),
    })?;
    store.write_blob(key, &encoded)
}
