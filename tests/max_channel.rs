//! Integration tests for the MAX channel's HTTP contract.
//!
//! An Axum stub stands in for the MAX Bot API on a random port. It records
//! every request and can be told to reject the first formatted message.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use campus_bot::channels::{Channel, MaxChannel};
use campus_bot::menu::{CallbackAction, MenuAction, MenuDescriptor};
use campus_bot::router::{Caller, Event, EventKind, Outbound, Reply, TextFormat};

const TOKEN: &str = "max-token";

/// One request as the stub saw it.
#[derive(Debug, Clone)]
struct Seen {
    path: &'static str,
    query: HashMap<String, String>,
    auth: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct StubState {
    seen: Arc<Mutex<Vec<Seen>>>,
    reject_next_formatted: Arc<AtomicBool>,
    polls: Arc<AtomicUsize>,
}

impl StubState {
    fn record(&self, path: &'static str, query: HashMap<String, String>, headers: &HeaderMap, body: Value) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.seen.lock().unwrap().push(Seen {
            path,
            query,
            auth,
            body,
        });
    }

    fn requests(&self, path: &str) -> Vec<Seen> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.path == path)
            .cloned()
            .collect()
    }
}

async fn messages(
    State(state): State<StubState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let formatted = body.get("format").is_some();
    state.record("messages", query, &headers, body);

    if formatted && state.reject_next_formatted.swap(false, Ordering::SeqCst) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"code": "bad.format", "message": "cannot parse markup"})),
        );
    }
    (StatusCode::OK, Json(json!({"message": {"body": {"mid": "m1"}}})))
}

async fn answers(
    State(state): State<StubState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.record("answers", query, &headers, body);
    Json(json!({"success": true}))
}

async fn updates(
    State(state): State<StubState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    state.record("updates", query, &headers, Value::Null);

    match state.polls.fetch_add(1, Ordering::SeqCst) {
        0 => Json(json!({
            "updates": [{
                "update_type": "message_created",
                "message": {
                    "sender": {"user_id": 42, "first_name": "Анна"},
                    "recipient": {"chat_id": 4242},
                    "body": {"text": "/help"}
                }
            }],
            "marker": 11
        })),
        1 => Json(json!({
            "updates": [
                {"update_type": "message_edited"},
                {
                    "update_type": "message_callback",
                    "callback": {
                        "callback_id": "cb-7",
                        "payload": "block_lms",
                        "user": {"user_id": 42}
                    },
                    "message": {"recipient": {"chat_id": 4242}}
                }
            ],
            "marker": 12
        })),
        _ => {
            // Idle long-poll: nothing new, no marker.
            tokio::time::sleep(Duration::from_millis(50)).await;
            Json(json!({"updates": []}))
        }
    }
}

async fn me(State(state): State<StubState>, headers: HeaderMap) -> Json<Value> {
    state.record("me", HashMap::new(), &headers, Value::Null);
    Json(json!({"user_id": 1, "name": "campus_bot", "is_bot": true}))
}

/// Start a stub MAX API on a random port, return (base_url, state).
async fn start_stub() -> (String, StubState) {
    let state = StubState::default();
    let app = Router::new()
        .route("/messages", post(messages))
        .route("/answers", post(answers))
        .route("/updates", get(updates))
        .route("/me", get(me))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), state)
}

fn channel(url: &str) -> MaxChannel {
    MaxChannel::new(url, SecretString::from(TOKEN))
}

fn inbound() -> Event {
    Event::from_text(Caller::new(42, 4242), Some("/help"))
}

fn menu() -> MenuDescriptor {
    MenuDescriptor::new()
        .single(MenuAction::callback("📚 LMS", &CallbackAction::Block("lms".into())))
        .single(MenuAction::link("🚀 App", "https://app.example.edu?role=student"))
}

#[tokio::test]
async fn reply_goes_to_chat_with_token_and_keyboard() {
    let (url, state) = start_stub().await;

    let reply = Reply::text("📋 Главное меню").with_menu(menu());
    channel(&url).deliver(&inbound(), reply.into()).await.unwrap();

    let sent = state.requests("messages");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].auth.as_deref(), Some(TOKEN));
    assert_eq!(sent[0].query.get("chat_id").map(String::as_str), Some("4242"));
    assert!(!sent[0].query.contains_key("user_id"));
    assert_eq!(sent[0].body["text"], "📋 Главное меню");

    let keyboard = &sent[0].body["attachments"][0];
    assert_eq!(keyboard["type"], "inline_keyboard");
    assert_eq!(keyboard["payload"]["buttons"][0][0]["payload"], "block_lms");
    assert_eq!(keyboard["payload"]["buttons"][1][0]["type"], "link");
}

#[tokio::test]
async fn reply_without_chat_goes_to_user_dialog() {
    let (url, state) = start_stub().await;

    let caller = Caller {
        chat_id: None,
        ..Caller::new(42, 0)
    };
    let event = Event::from_text(caller, Some("hi"));
    channel(&url)
        .deliver(&event, Reply::text("ok").into())
        .await
        .unwrap();

    let sent = state.requests("messages");
    assert_eq!(sent[0].query.get("user_id").map(String::as_str), Some("42"));
    assert!(!sent[0].query.contains_key("chat_id"));
}

#[tokio::test]
async fn long_reply_splits_and_keyboard_rides_on_last_chunk() {
    let (url, state) = start_stub().await;

    let first = "а".repeat(3000);
    let second = "б".repeat(3000);
    let reply = Reply::text(format!("{first}\n{second}")).with_menu(menu());
    channel(&url).deliver(&inbound(), reply.into()).await.unwrap();

    let sent = state.requests("messages");
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].body["text"], first.as_str());
    assert!(sent[0].body.get("attachments").is_none());
    assert_eq!(sent[1].body["text"], second.as_str());
    assert_eq!(sent[1].body["attachments"][0]["type"], "inline_keyboard");
}

#[tokio::test]
async fn rejected_format_is_retried_as_plain_text() {
    let (url, state) = start_stub().await;
    state.reject_next_formatted.store(true, Ordering::SeqCst);

    let reply = Reply::text("**Университетский бот**")
        .with_menu(menu())
        .with_format(TextFormat::Markdown);
    channel(&url).deliver(&inbound(), reply.into()).await.unwrap();

    let sent = state.requests("messages");
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].body["format"], "markdown");
    assert!(sent[1].body.get("format").is_none());
    assert_eq!(sent[1].body["text"], sent[0].body["text"]);
    assert_eq!(sent[1].body["attachments"], sent[0].body["attachments"]);
}

#[tokio::test]
async fn acks_answer_the_callback() {
    let (url, state) = start_stub().await;
    let max = channel(&url);

    max.deliver(&inbound(), Outbound::ack("cb-1", Some("Роль выбрана: 🎓 Студент".into())))
        .await
        .unwrap();
    max.deliver(&inbound(), Outbound::ack("cb-2", None))
        .await
        .unwrap();

    let answers = state.requests("answers");
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0].auth.as_deref(), Some(TOKEN));
    assert_eq!(answers[0].query.get("callback_id").map(String::as_str), Some("cb-1"));
    assert_eq!(answers[0].body, json!({"notification": "Роль выбрана: 🎓 Студент"}));

    assert_eq!(answers[1].query.get("callback_id").map(String::as_str), Some("cb-2"));
    let quiet = answers[1].body["notification"].as_str().unwrap_or_default();
    assert!(!quiet.trim().is_empty(), "answer must carry a notification");
    assert!(state.requests("messages").is_empty());
}

#[tokio::test]
async fn poll_forwards_updates_and_advances_marker() {
    let (url, state) = start_stub().await;
    let max = channel(&url);

    let mut events = max.start().await.unwrap();
    let first = tokio::time::timeout(Duration::from_secs(5), events.next())
        .await
        .unwrap()
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(5), events.next())
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(first.kind, EventKind::Command { ref name, .. } if name == "help"));
    assert_eq!(first.caller.user_id, Some(42));
    assert_eq!(
        second.kind,
        EventKind::Action {
            callback_id: "cb-7".into(),
            payload: "block_lms".into()
        }
    );

    // Wait for the poll that follows the second batch.
    for _ in 0..100 {
        if state.requests("updates").len() >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let polls = state.requests("updates");
    assert!(polls.len() >= 3);
    assert_eq!(polls[0].query.get("marker"), None);
    assert_eq!(polls[1].query.get("marker").map(String::as_str), Some("11"));
    assert_eq!(polls[2].query.get("marker").map(String::as_str), Some("12"));
    // An idle poll without a marker keeps the last one.
    if let Some(idle) = polls.get(3) {
        assert_eq!(idle.query.get("marker").map(String::as_str), Some("12"));
    }

    let first_poll = &polls[0];
    assert_eq!(first_poll.auth.as_deref(), Some(TOKEN));
    assert_eq!(first_poll.query.get("timeout").map(String::as_str), Some("30"));
    assert!(
        first_poll
            .query
            .get("types")
            .is_some_and(|t| t.split(',').any(|t| t == "bot_started"))
    );
}

#[tokio::test]
async fn health_check_calls_me() {
    let (url, state) = start_stub().await;

    channel(&url).health_check().await.unwrap();

    let me = state.requests("me");
    assert_eq!(me.len(), 1);
    assert_eq!(me[0].auth.as_deref(), Some(TOKEN));
}
