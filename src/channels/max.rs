//! MAX channel: long-polls the MAX Bot API for updates.
//!
//! Inbound updates (`message_created`, `message_callback`, `bot_started`,
//! `bot_stopped`) are decoded into router events. Menus are drawn as `inline_keyboard`
//! attachments.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::channels::{Channel, EventStream};
use crate::config::BotConfig;
use crate::error::ChannelError;
use crate::menu::{MenuAction, MenuDescriptor};
use crate::router::{Caller, Event, LifecycleKind, Outbound, Reply, TextFormat};

/// Maximum text length accepted by `POST /messages`.
const MAX_MESSAGE_LENGTH: usize = 4000;

/// Long-poll timeout passed to `GET /updates`.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Back-off after a failed poll.
const POLL_RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(5);

const UPDATE_TYPES: &str = "message_created,message_callback,bot_started,bot_stopped";

/// `POST /answers` needs a message or a notification; this is the quiet one.
const DEFAULT_ACK_NOTIFICATION: &str = "✓";

/// Where a reply goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Chat(i64),
    User(i64),
}

impl Recipient {
    /// Prefer the chat, fall back to the user's dialog.
    pub fn for_caller(caller: &Caller) -> Option<Self> {
        caller
            .chat_id
            .map(Self::Chat)
            .or_else(|| caller.user_id.map(Self::User))
    }

    fn query(&self) -> (&'static str, String) {
        match self {
            Self::Chat(id) => ("chat_id", id.to_string()),
            Self::User(id) => ("user_id", id.to_string()),
        }
    }
}

/// MAX channel, connected via long-polling.
pub struct MaxChannel {
    api_url: String,
    bot_token: SecretString,
    client: reqwest::Client,
}

impl MaxChannel {
    pub fn new(api_url: impl Into<String>, bot_token: SecretString) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(config.max_api_url.clone(), config.bot_token.clone())
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_url)
    }

    /// POST a JSON body, returning the HTTP status on a non-2xx answer.
    async fn post_json(
        &self,
        method: &str,
        query: &[(&str, String)],
        body: &Value,
    ) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .header("Authorization", self.bot_token.expose_secret())
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "max".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            return Ok(());
        }

        let status = resp.status();
        let err = resp.text().await.unwrap_or_default();
        Err(ChannelError::SendFailed {
            name: "max".into(),
            reason: format!("{method} returned {status}: {err}"),
        })
    }

    /// Send a reply, splitting long text. The menu rides on the last chunk.
    async fn send_reply(&self, recipient: Recipient, reply: &Reply) -> Result<(), ChannelError> {
        let chunks = split_message(&reply.text, MAX_MESSAGE_LENGTH);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.iter().enumerate() {
            let menu = if i == last { reply.menu.as_ref() } else { None };
            self.send_chunk(recipient, chunk, menu, reply.format).await?;
        }
        Ok(())
    }

    /// Send one chunk, formatted first with a plain-text fallback.
    async fn send_chunk(
        &self,
        recipient: Recipient,
        text: &str,
        menu: Option<&MenuDescriptor>,
        format: Option<TextFormat>,
    ) -> Result<(), ChannelError> {
        let query = [recipient.query()];
        let body = message_body(text, menu, format);

        match self.post_json("messages", &query, &body).await {
            Ok(()) => Ok(()),
            Err(e) if format.is_some() => {
                tracing::warn!("MAX sendMessage with format failed ({e}); retrying as plain text");
                let plain = message_body(text, menu, None);
                self.post_json("messages", &query, &plain).await
            }
            Err(e) => Err(e),
        }
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        notification: Option<&str>,
    ) -> Result<(), ChannelError> {
        let body = answer_body(notification);
        self.post_json("answers", &[("callback_id", callback_id.to_string())], &body)
            .await
    }
}

// ── Channel trait implementation ────────────────────────────────────

#[async_trait]
impl Channel for MaxChannel {
    fn name(&self) -> &str {
        "max"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let url = self.api_url("updates");
        let token = self.bot_token.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut marker: Option<i64> = None;

            tracing::info!("MAX channel listening for updates...");

            loop {
                let mut query = vec![
                    ("limit", "100".to_string()),
                    ("timeout", POLL_TIMEOUT_SECS.to_string()),
                    ("types", UPDATE_TYPES.to_string()),
                ];
                if let Some(m) = marker {
                    query.push(("marker", m.to_string()));
                }

                let resp = match client
                    .get(&url)
                    .header("Authorization", token.expose_secret())
                    .query(&query)
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("MAX poll error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                if !resp.status().is_success() {
                    tracing::warn!(status = %resp.status(), "MAX poll rejected");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }

                let data: Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("MAX parse error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                if let Some(next) = data.get("marker").and_then(Value::as_i64) {
                    marker = Some(next);
                }

                let updates = data
                    .get("updates")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();

                for update in updates {
                    let Some(event) = decode_update(update) else {
                        continue;
                    };
                    if tx.send(event).is_err() {
                        tracing::info!("MAX listener channel closed");
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn deliver(&self, event: &Event, outbound: Outbound) -> Result<(), ChannelError> {
        match outbound {
            Outbound::Ack {
                callback_id,
                notification,
            } => {
                self.answer_callback(&callback_id, notification.as_deref())
                    .await
            }
            Outbound::Reply(reply) => {
                let recipient =
                    Recipient::for_caller(&event.caller).ok_or_else(|| ChannelError::SendFailed {
                        name: "max".into(),
                        reason: "event has neither chat_id nor user_id".into(),
                    })?;
                self.send_reply(recipient, &reply).await
            }
        }
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("me"))
            .header("Authorization", self.bot_token.expose_secret())
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "max".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            tracing::warn!(status = %resp.status(), "MAX getMe failed");
            Err(ChannelError::HealthCheckFailed { name: "max".into() })
        }
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("MAX channel shutting down");
        Ok(())
    }
}

// ── Decoding ────────────────────────────────────────────────────────

/// Decode one entry of `GET /updates` into an event.
///
/// Update types the router does not handle yield `None`.
pub fn decode_update(update: &Value) -> Option<Event> {
    match update.get("update_type")?.as_str()? {
        "message_created" => {
            let message = update.get("message")?;
            let caller = caller_from(message.get("sender"), recipient_chat_id(message));
            let text = message
                .get("body")
                .and_then(|b| b.get("text"))
                .and_then(Value::as_str);
            Some(Event::from_text(caller, text))
        }
        "message_callback" => {
            let callback = update.get("callback")?;
            let callback_id = callback.get("callback_id")?.as_str()?;
            let payload = callback
                .get("payload")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let chat_id = update.get("message").and_then(recipient_chat_id);
            let caller = caller_from(callback.get("user"), chat_id);
            Some(Event::action(caller, callback_id, payload))
        }
        kind @ ("bot_started" | "bot_stopped") => {
            let chat_id = update.get("chat_id").and_then(Value::as_i64);
            let caller = caller_from(update.get("user"), chat_id);
            let payload = update
                .get("payload")
                .and_then(Value::as_str)
                .map(String::from);
            Some(Event::lifecycle(caller, LifecycleKind::parse(kind), payload))
        }
        other => {
            tracing::trace!(update_type = other, "Skipping MAX update");
            None
        }
    }
}

fn recipient_chat_id(message: &Value) -> Option<i64> {
    message
        .get("recipient")
        .and_then(|r| r.get("chat_id"))
        .and_then(Value::as_i64)
}

fn caller_from(user: Option<&Value>, chat_id: Option<i64>) -> Caller {
    let field = |name: &str| {
        user.and_then(|u| u.get(name))
            .and_then(Value::as_str)
            .map(String::from)
    };
    Caller {
        user_id: user.and_then(|u| u.get("user_id")).and_then(Value::as_i64),
        chat_id,
        first_name: field("first_name"),
        last_name: field("last_name"),
        username: field("username"),
    }
}

// ── Rendering ───────────────────────────────────────────────────────

/// Draw a menu as an `inline_keyboard` attachment.
pub fn render_keyboard(menu: &MenuDescriptor) -> Value {
    let buttons: Vec<Vec<Value>> = menu
        .rows
        .iter()
        .map(|row| row.iter().map(render_button).collect())
        .collect();
    json!({
        "type": "inline_keyboard",
        "payload": { "buttons": buttons }
    })
}

fn render_button(action: &MenuAction) -> Value {
    match action {
        MenuAction::Callback { label, payload } => json!({
            "type": "callback",
            "text": label,
            "payload": payload,
        }),
        MenuAction::Link { label, url } => json!({
            "type": "link",
            "text": label,
            "url": url,
        }),
    }
}

/// Body of a `POST /messages` request.
pub fn message_body(text: &str, menu: Option<&MenuDescriptor>, format: Option<TextFormat>) -> Value {
    let mut body = json!({ "text": text });
    if let Some(menu) = menu.filter(|m| !m.is_empty()) {
        body["attachments"] = json!([render_keyboard(menu)]);
    }
    if let Some(format) = format {
        body["format"] = json!(match format {
            TextFormat::Markdown => "markdown",
            TextFormat::Html => "html",
        });
    }
    body
}

/// Body of a `POST /answers` request.
pub fn answer_body(notification: Option<&str>) -> Value {
    let text = notification
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_ACK_NOTIFICATION);
    json!({ "notification": text })
}

/// Split a message into chunks of at most `max_chars` characters.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        // Byte offset of the first character past the limit.
        let Some((limit, _)) = remaining.char_indices().nth(max_chars) else {
            chunks.push(remaining.to_string());
            break;
        };

        let window = &remaining[..limit];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────
