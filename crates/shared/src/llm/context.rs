use crate::models::{ConversationSession, Message};

/// How many trailing messages of a session are sent along as memory.
pub const CONTEXT_WINDOW_MESSAGES: usize = 10;

const TRANSCRIPT_HEADER: &str = "Conversation so far:";
const QUESTION_LABEL: &str = "Current question:";

/// Builds the prompt sent upstream: a transcript of the last
/// [`CONTEXT_WINDOW_MESSAGES`] messages followed by the new input.
///
/// With no prior messages the prompt is only the question line.
pub fn assemble_context(session: &ConversationSession, new_input: &str) -> String {
    let transcript = render_transcript(context_window(&session.messages));
    let question = format!("{QUESTION_LABEL} {}", new_input.trim());

    if transcript.is_empty() {
        return question;
    }

    format!("{TRANSCRIPT_HEADER}\n{transcript}\n\n{question}")
}

/// The trailing slice of `messages` that fits in the context window.
pub fn context_window(messages: &[Message]) -> &[Message] {
    let start = messages.len().saturating_sub(CONTEXT_WINDOW_MESSAGES);
    &messages[start..]
}

fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| format!("{}: {}", message.sender.label(), message.content))
        .collect::<Vec<_>>()
        .join("\n")
}
