use chrono::{DateTime, Duration, Utc};
use shared::models::{ConversationSession, Message, SessionId, UserProfile};
use shared::repos::{
    BlobStore, JsonFileStore, MemoryStore, ProfileRepository, SESSIONS_KEY, SessionRepository,
    StoreError,
};
use shared::sessions::{append_message, delete_session, start_session};

#[test]
fn file_store_round_trips_sessions_with_nested_messages() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = JsonFileStore::open(dir.path()).expect("store should open");
    let sessions = sample_sessions();

    store
        .save_sessions(&sessions)
        .expect("sessions should save");
    let loaded = store.load_sessions().expect("sessions should load");

    assert_eq!(loaded, sessions);
    assert!(dir.path().join("chat_sessions.json").exists());
}

#[test]
fn memory_store_round_trips_sessions() {
    let store = MemoryStore::new();
    let sessions = sample_sessions();

    store
        .save_sessions(&sessions)
        .expect("sessions should save");

    assert_eq!(store.load_sessions().expect("sessions should load"), sessions);
}

#[test]
fn fresh_store_has_no_sessions_and_no_profile() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = JsonFileStore::open(dir.path().join("nested")).expect("store should open");

    assert!(store.load_sessions().expect("load should succeed").is_empty());
    assert!(store.load_profile().expect("load should succeed").is_none());
}

#[test]
fn profile_round_trips_with_optional_avatar() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = JsonFileStore::open(dir.path()).expect("store should open");
    let profile = UserProfile {
        name: "Ana".to_string(),
        stream: "Science".to_string(),
        goal: "Pass the entrance exam".to_string(),
        xp: 120,
        avatar: Some("data:image/png;base64,iVBORw0KGgo=".to_string()),
    };

    store.save_profile(&profile).expect("profile should save");

    assert_eq!(
        store.load_profile().expect("profile should load"),
        Some(profile)
    );
}

#[test]
fn deleting_unknown_session_leaves_persisted_list_unchanged() {
    let store = MemoryStore::new();
    store
        .save_sessions(&sample_sessions())
        .expect("sessions should save");

    let mut sessions = store.load_sessions().expect("sessions should load");
    let removed = delete_session(&mut sessions, SessionId(999));
    store
        .save_sessions(&sessions)
        .expect("sessions should save");

    assert!(!removed);
    assert_eq!(
        store.load_sessions().expect("sessions should load"),
        sample_sessions()
    );
}

#[test]
fn corrupt_blob_is_reported_as_invalid_data() {
    let store = MemoryStore::new();
    store
        .write_blob(SESSIONS_KEY, "{not json")
        .expect("raw write should succeed");

    let err = store
        .load_sessions()
        .expect_err("corrupt blob should fail to decode");

    assert!(matches!(err, StoreError::InvalidData { ref key, .. } if key == SESSIONS_KEY));
}

#[test]
fn last_writer_wins_between_two_handles() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let first = JsonFileStore::open(dir.path()).expect("store should open");
    let second = JsonFileStore::open(dir.path()).expect("store should open");

    let mut from_first = first.load_sessions().expect("load should succeed");
    let mut from_second = second.load_sessions().expect("load should succeed");
    start_session(&mut from_first, "first tab", base_time());
    start_session(&mut from_second, "second tab", base_time());

    first
        .save_sessions(&from_first)
        .expect("first save should succeed");
    second
        .save_sessions(&from_second)
        .expect("second save should succeed");

    let titles = first
        .load_sessions()
        .expect("load should succeed")
        .into_iter()
        .map(|session| session.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["second tab".to_string()]);
}

fn sample_sessions() -> Vec<ConversationSession> {
    let now = base_time();
    let mut sessions = Vec::new();

    let first = start_session(&mut sessions, "What is ownership?", now);
    append_message(
        &mut sessions,
        first,
        Message::user("What is ownership?", now + Duration::milliseconds(15)),
    );
    append_message(
        &mut sessions,
        first,
        Message::assistant(
            "<p>Each value has a single <b>owner</b>.</p>",
            now + Duration::milliseconds(1_250),
        ),
    );

    let second = start_session(&mut sessions, "Lifetimes", now + Duration::minutes(3));
    append_message(
        &mut sessions,
        second,
        Message::user("Lifetimes", now + Duration::minutes(3)),
    );

    sessions
}

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-02-15T09:30:00.123456789Z")
        .expect("timestamp should parse")
        .with_timezone(&Utc)
}
