use chrono::Utc;
use shared::llm::{GenerateRequest, assemble_context};
use shared::models::{ConversationSession, Message, SessionId, UserProfile};
use shared::repos::{ProfileRepository, SessionRepository, StoreError};
use shared::sessions;
use thiserror::Error;
use tracing::{debug, info};

use crate::client::ProxyClient;
use crate::state::ClientState;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message must not be empty")]
    EmptyInput,
    #[error("no conversation with id {0}")]
    UnknownSession(SessionId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub state: ClientState,
    pub session_id: SessionId,
    pub reply: String,
}

/// Session and profile operations backed by a repository, with replies
/// fetched through the proxy.
pub struct ChatService<R> {
    repository: R,
    proxy: ProxyClient,
}

impl<R> ChatService<R>
where
    R: SessionRepository + ProfileRepository,
{
    pub fn new(repository: R, proxy: ProxyClient) -> Self {
        Self { repository, proxy }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Starting state: the stored profile and no open conversation.
    pub fn load_state(&self) -> Result<ClientState, ChatError> {
        Ok(ClientState::with_profile(self.repository.load_profile()?))
    }

    pub fn save_profile(
        &self,
        state: ClientState,
        profile: UserProfile,
    ) -> Result<ClientState, ChatError> {
        self.repository.save_profile(&profile)?;
        Ok(ClientState {
            profile: Some(profile),
            ..state
        })
    }

    /// Sends one user message and records both sides of the exchange.
    ///
    /// The conversation is created on first use. The prompt carries the
    /// messages recorded before this one.
    pub async fn send(&self, state: ClientState, input: &str) -> Result<ChatTurn, ChatError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let sent_at = Utc::now();
        let mut sessions_list = self.repository.load_sessions()?;
        let session_id = match state
            .current_session_id
            .filter(|id| sessions::find_session(&sessions_list, *id).is_some())
        {
            Some(id) => id,
            None => {
                let id = sessions::start_session(&mut sessions_list, input, sent_at);
                info!(session_id = %id, "started conversation");
                id
            }
        };

        let prompt = match sessions::find_session(&sessions_list, session_id) {
            Some(session) => assemble_context(session, input),
            None => return Err(ChatError::UnknownSession(session_id)),
        };
        let mut request = GenerateRequest::from_prompt(prompt);
        if let Some(profile) = state.profile.as_ref() {
            request = request.with_system_instruction(profile.system_instruction());
        }

        let reply = self.proxy.ask(&request).await;

        record_exchange(
            &mut sessions_list,
            session_id,
            Message::user(input, sent_at),
            Message::assistant(reply.clone(), Utc::now()),
        )?;
        self.repository.save_sessions(&sessions_list)?;
        debug!(session_id = %session_id, "recorded exchange");

        Ok(ChatTurn {
            state: state.with_session(session_id),
            session_id,
            reply,
        })
    }

    /// Detaches from the current conversation; the next message starts a new one.
    pub fn new_conversation(&self, state: ClientState) -> ClientState {
        state.without_session()
    }

    pub fn open_session(
        &self,
        state: ClientState,
        id: SessionId,
    ) -> Result<(ClientState, ConversationSession), ChatError> {
        let sessions_list = self.repository.load_sessions()?;
        let session = sessions::find_session(&sessions_list, id)
            .cloned()
            .ok_or(ChatError::UnknownSession(id))?;

        Ok((state.with_session(id), session))
    }

    /// Deletes a conversation. Unknown ids are a no-op and report `false`.
    pub fn delete_session(
        &self,
        state: ClientState,
        id: SessionId,
    ) -> Result<(ClientState, bool), ChatError> {
        let mut sessions_list = self.repository.load_sessions()?;
        let removed = sessions::delete_session(&mut sessions_list, id);
        if removed {
            self.repository.save_sessions(&sessions_list)?;
            info!(session_id = %id, "deleted conversation");
        }

        let state = if state.current_session_id == Some(id) {
            state.without_session()
        } else {
            state
        };
        Ok((state, removed))
    }

    /// All conversations, newest first.
    pub fn list_sessions(&self) -> Result<Vec<ConversationSession>, ChatError> {
        let sessions_list = self.repository.load_sessions()?;
        Ok(sessions::sessions_newest_first(&sessions_list)
            .into_iter()
            .cloned()
            .collect())
    }
}

fn record_exchange(
    sessions_list: &mut [ConversationSession],
    session_id: SessionId,
    user: Message,
    assistant: Message,
) -> Result<(), ChatError> {
    for message in [user, assistant] {
        if !sessions::append_message(sessions_list, session_id, message) {
            return Err(ChatError::UnknownSession(session_id));
        }
    }
    Ok(())
}
