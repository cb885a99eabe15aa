use shared::models::SessionId;

/// One line typed at the terminal prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    New,
    List,
    Open(SessionId),
    Delete(SessionId),
    Quit,
    Help,
    Blank,
    Invalid(String),
}

pub const HELP_TEXT: &str = "\
commands:
  /new           start a new conversation
  /list          list saved conversations
  /open <id>     continue a saved conversation
  /delete <id>   delete a saved conversation
  /quit          exit
anything else is sent as a message";

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Blank;
        }
        if !line.starts_with('/') {
            return Self::Send(line.to_string());
        }

        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default();
        let argument = words.next();

        match (name, argument) {
            ("/new", None) => Self::New,
            ("/list", None) => Self::List,
            ("/quit" | "/exit", None) => Self::Quit,
            ("/help", None) => Self::Help,
            ("/open", Some(raw)) => parse_id(raw).map_or_else(Self::Invalid, Self::Open),
            ("/delete", Some(raw)) => parse_id(raw).map_or_else(Self::Invalid, Self::Delete),
            ("/open" | "/delete", None) => Self::Invalid(format!("usage: {name} <id>")),
            _ => Self::Invalid(format!("unknown command {name}; try /help")),
        }
    }
}

fn parse_id(raw: &str) -> Result<SessionId, String> {
    raw.parse::<SessionId>()
        .map_err(|_| format!("invalid conversation id: {raw}"))
}
