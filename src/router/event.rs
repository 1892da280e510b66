//! Inbound chat events.
//!
//! Channels decode their transport's updates into [`Event`]s. An event is
//! handled once and then dropped.

/// Who sent the event, as far as the transport could tell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Option<i64>,
    pub chat_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl Caller {
    pub fn new(user_id: i64, chat_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            chat_id: Some(chat_id),
            ..Default::default()
        }
    }

    pub fn with_first_name(mut self, name: impl Into<String>) -> Self {
        self.first_name = Some(name.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Join optional name parts, skipping blanks.
pub fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Lifecycle notifications from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleKind {
    /// The user opened the bot (possibly through a deep link with a payload).
    BotStarted,
    /// Anything else the transport reports, e.g. `bot_stopped`.
    Other(String),
}

impl LifecycleKind {
    /// Map a transport update type onto a lifecycle kind.
    pub fn parse(kind: &str) -> Self {
        match kind {
            "bot_started" => Self::BotStarted,
            other => Self::Other(other.to_string()),
        }
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `/name ...`. `name` is lower-cased with any `@bot` suffix removed.
    Command { name: String, raw_text: String },
    /// A callback button was pressed.
    Action { callback_id: String, payload: String },
    /// Free text, or a message without text.
    Message { text: Option<String> },
    Lifecycle {
        kind: LifecycleKind,
        payload: Option<String>,
    },
}

/// A single inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub caller: Caller,
    pub kind: EventKind,
}

impl Event {
    pub fn new(caller: Caller, kind: EventKind) -> Self {
        Self { caller, kind }
    }

    /// Classify a text message as a command or as free text.
    pub fn from_text(caller: Caller, text: Option<&str>) -> Self {
        let kind = match text.and_then(parse_command) {
            Some(name) => EventKind::Command {
                name,
                raw_text: text.unwrap_or_default().to_string(),
            },
            None => EventKind::Message {
                text: text.map(str::to_string),
            },
        };
        Self::new(caller, kind)
    }

    pub fn action(caller: Caller, callback_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::new(
            caller,
            EventKind::Action {
                callback_id: callback_id.into(),
                payload: payload.into(),
            },
        )
    }

    pub fn lifecycle(caller: Caller, kind: LifecycleKind, payload: Option<String>) -> Self {
        Self::new(caller, EventKind::Lifecycle { kind, payload })
    }

    pub fn bot_started(caller: Caller, payload: Option<String>) -> Self {
        Self::lifecycle(caller, LifecycleKind::BotStarted, payload)
    }

    /// Short label for logs.
    pub fn describe(&self) -> String {
        match &self.kind {
            EventKind::Command { name, .. } => format!("command /{name}"),
            EventKind::Action { payload, .. } => format!("action {payload}"),
            EventKind::Message { .. } => "message".to_string(),
            EventKind::Lifecycle { kind, .. } => format!("lifecycle {kind:?}"),
        }
    }
}

/// Extract the command name from `/name@bot args`.
///
/// Returns `None` for anything that is not a slash command.
pub fn parse_command(text: &str) -> Option<String> {
    let rest = text.trim().strip_prefix('/')?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    let word = rest.split_whitespace().next()?;
    let name = word.split('@').next().unwrap_or(word);
    if name.is_empty() {
        return None;
    }
    Some(name.to_lowercase())
}
