use shared::models::{SessionId, UserProfile};

/// Everything the client tracks between actions. Operations take it by value
/// and hand back the updated copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    pub profile: Option<UserProfile>,
    pub current_session_id: Option<SessionId>,
}

impl ClientState {
    pub fn with_profile(profile: Option<UserProfile>) -> Self {
        Self {
            profile,
            current_session_id: None,
        }
    }

    pub fn with_session(self, id: SessionId) -> Self {
        Self {
            current_session_id: Some(id),
            ..self
        }
    }

    pub fn without_session(self) -> Self {
        Self {
            current_session_id: None,
            ..self
        }
    }
}
