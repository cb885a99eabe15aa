//! Pure operations over the in-memory session list.
//!
//! Callers load the whole list from a repository, apply one of these, and
//! save the list back.

use chrono::{DateTime, Utc};

use crate::models::{ConversationSession, Message, SessionId};

pub const DEFAULT_SESSION_TITLE: &str = "New conversation";
const SESSION_TITLE_MAX_CHARS: usize = 40;

/// Next identifier derived from `now`, strictly greater than every existing id.
pub fn next_session_id(sessions: &[ConversationSession], now: DateTime<Utc>) -> SessionId {
    let candidate = now.timestamp_millis();
    let highest = sessions.iter().map(|session| session.id.0).max();

    match highest {
        Some(highest) if highest >= candidate => SessionId(highest.saturating_add(1)),
        _ => SessionId(candidate),
    }
}

/// Creates a session titled after the first user input and appends it.
pub fn start_session(
    sessions: &mut Vec<ConversationSession>,
    first_input: &str,
    now: DateTime<Utc>,
) -> SessionId {
    let id = next_session_id(sessions, now);
    sessions.push(ConversationSession {
        id,
        title: session_title(first_input),
        created_at: now,
        messages: Vec::new(),
    });
    id
}

pub fn session_title(input: &str) -> String {
    let compact = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.is_empty() {
        return DEFAULT_SESSION_TITLE.to_string();
    }

    let mut title = compact
        .chars()
        .take(SESSION_TITLE_MAX_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string();
    if compact.chars().count() > SESSION_TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

pub fn find_session(
    sessions: &[ConversationSession],
    id: SessionId,
) -> Option<&ConversationSession> {
    sessions.iter().find(|session| session.id == id)
}

/// Appends to the session's log. Returns `false` when the session is unknown.
pub fn append_message(
    sessions: &mut [ConversationSession],
    id: SessionId,
    message: Message,
) -> bool {
    match sessions.iter_mut().find(|session| session.id == id) {
        Some(session) => {
            session.messages.push(message);
            true
        }
        None => false,
    }
}

/// Removes the session if present; unknown ids leave the list untouched.
pub fn delete_session(sessions: &mut Vec<ConversationSession>, id: SessionId) -> bool {
    let before = sessions.len();
    sessions.retain(|session| session.id != id);
    sessions.len() != before
}

/// Newest first, for listings.
pub fn sessions_newest_first(sessions: &[ConversationSession]) -> Vec<&ConversationSession> {
    let mut ordered = sessions.iter().collect::<Vec<_>>();
    ordered.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| right.id.cmp(&left.id))
    });
    ordered
}
