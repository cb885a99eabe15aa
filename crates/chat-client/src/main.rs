use std::io;

use chat_client::chat::{ChatError, ChatService};
use chat_client::client::ProxyClient;
use chat_client::commands::{Command, HELP_TEXT};
use chat_client::state::ClientState;
use shared::config::ClientConfig;
use shared::models::UserProfile;
use shared::repos::JsonFileStore;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::{error, info};

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "chat_client=warn,shared=warn".to_string()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match ClientConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("failed to read config: {err}");
            std::process::exit(1);
        }
    };

    let store = match JsonFileStore::open(config.data_dir.clone()) {
        Ok(store) => store,
        Err(err) => {
            error!("failed to open data dir {}: {err}", config.data_dir.display());
            std::process::exit(1);
        }
    };
    info!(data_dir = %store.dir().display(), "session store opened");

    let proxy = match ProxyClient::new(&config) {
        Ok(proxy) => proxy,
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    };
    info!(proxy_url = proxy.proxy_url(), "chat client configured");

    let service = ChatService::new(store, proxy);
    if let Err(err) = run(&service).await {
        error!("chat client stopped: {err}");
        std::process::exit(1);
    }
}

#[derive(Debug, thiserror::Error)]
enum ReplError {
    #[error("terminal io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Chat(#[from] ChatError),
}

async fn run(service: &ChatService<JsonFileStore>) -> Result<(), ReplError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut state = service.load_state()?;

    if state.profile.is_none() {
        let Some(profile) = onboard(&mut lines).await? else {
            return Ok(());
        };
        state = service.save_profile(state, profile)?;
    }
    if let Some(profile) = state.profile.as_ref() {
        println!("Welcome, {}! Type /help for commands.", profile.name);
    }

    loop {
        let Some(line) = prompt(&mut lines, "> ").await? else {
            return Ok(());
        };

        state = match Command::parse(&line) {
            Command::Blank => state,
            Command::Quit => return Ok(()),
            Command::Help => {
                println!("{HELP_TEXT}");
                state
            }
            Command::Invalid(message) => {
                println!("{message}");
                state
            }
            Command::Send(text) => {
                let turn = service.send(state, &text).await?;
                println!("{}\n", turn.reply);
                turn.state
            }
            Command::New => {
                println!("Started a new conversation.");
                service.new_conversation(state)
            }
            Command::List => {
                print_sessions(service, &state)?;
                state
            }
            Command::Open(id) => match service.open_session(state.clone(), id) {
                Ok((opened, session)) => {
                    println!("== {} ==", session.title);
                    for message in &session.messages {
                        println!("{}: {}", message.sender.label(), message.content);
                    }
                    opened
                }
                Err(ChatError::UnknownSession(id)) => {
                    println!("No conversation with id {id}.");
                    state
                }
                Err(err) => return Err(err.into()),
            },
            Command::Delete(id) => {
                let (next, removed) = service.delete_session(state, id)?;
                if removed {
                    println!("Deleted conversation {id}.");
                } else {
                    println!("No conversation with id {id}.");
                }
                next
            }
        };
    }
}

fn print_sessions(
    service: &ChatService<JsonFileStore>,
    state: &ClientState,
) -> Result<(), ChatError> {
    let sessions = service.list_sessions()?;
    if sessions.is_empty() {
        println!("No saved conversations yet.");
        return Ok(());
    }

    for session in sessions {
        let marker = if state.current_session_id == Some(session.id) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {}  {}  ({} messages, {})",
            session.id,
            session.title,
            session.messages.len(),
            session.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

async fn onboard(lines: &mut InputLines) -> Result<Option<UserProfile>, io::Error> {
    println!("Let's set up your profile.");

    let Some(name) = prompt_required(lines, "Your name: ").await? else {
        return Ok(None);
    };
    let Some(stream) = prompt_required(lines, "Your stream or track: ").await? else {
        return Ok(None);
    };
    let Some(goal) = prompt_required(lines, "Your goal: ").await? else {
        return Ok(None);
    };

    Ok(Some(UserProfile {
        name,
        stream,
        goal,
        xp: 0,
        avatar: None,
    }))
}

async fn prompt_required(
    lines: &mut InputLines,
    label: &str,
) -> Result<Option<String>, io::Error> {
    loop {
        let Some(answer) = prompt(lines, label).await? else {
            return Ok(None);
        };
        let answer = answer.trim();
        if !answer.is_empty() {
            return Ok(Some(answer.to_string()));
        }
    }
}

/// `None` once stdin is closed.
async fn prompt(lines: &mut InputLines, label: &str) -> Result<Option<String>, io::Error> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await
}
