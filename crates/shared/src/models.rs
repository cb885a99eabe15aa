use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

/// Time-derived session identifier (milliseconds since the epoch, bumped to
/// stay unique within a store).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse::<i64>().map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            sender: Sender::User,
            timestamp,
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            sender: Sender::Assistant,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: SessionId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub stream: String,
    pub goal: String,
    #[serde(default)]
    pub xp: u32,
    /// Avatar image as a data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserProfile {
    /// System instruction sent upstream so replies fit the user's track and goal.
    pub fn system_instruction(&self) -> String {
        format!(
            "You are a friendly study mentor talking to {name}. \
             {name} follows the {stream} track and their goal is: {goal}. \
             Answer clearly and keep replies focused on helping them learn.",
            name = self.name.trim(),
            stream = self.stream.trim(),
            goal = self.goal.trim(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Error body shared by the proxy and the client: `{ "error": message }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
