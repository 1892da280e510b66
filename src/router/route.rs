//! Event classification.
//!
//! `classify` is the transition table with the backend taken out: it decides
//! which handler an event goes to, and nothing else.

use crate::menu::CallbackAction;

use super::event::{EventKind, LifecycleKind};

/// The handler an event is dispatched to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Start,
    Help,
    Schedule,
    Profile,
    UnknownCommand,
    SelectRole { callback_id: String, token: String },
    OpenBlock { callback_id: String, token: String },
    BackToMenu { callback_id: String },
    UnrecognizedAction { callback_id: String, payload: String },
    /// Deep-link payload of a `bot_started` event, echoed back.
    EchoStartPayload(String),
    UnknownText,
    /// Nothing to say.
    Ignore,
}

impl Route {
    /// Whether the handler needs to know who the caller is.
    pub fn needs_identity(&self) -> bool {
        matches!(
            self,
            Self::Start | Self::Profile | Self::SelectRole { .. } | Self::BackToMenu { .. }
        )
    }

    /// Callback id to acknowledge, for action routes.
    pub fn callback_id(&self) -> Option<&str> {
        match self {
            Self::SelectRole { callback_id, .. }
            | Self::OpenBlock { callback_id, .. }
            | Self::BackToMenu { callback_id }
            | Self::UnrecognizedAction { callback_id, .. } => Some(callback_id),
            _ => None,
        }
    }
}

pub fn classify(kind: &EventKind) -> Route {
    match kind {
        EventKind::Command { name, .. } => match name.as_str() {
            "start" => Route::Start,
            "help" => Route::Help,
            "schedule" => Route::Schedule,
            "profile" => Route::Profile,
            _ => Route::UnknownCommand,
        },
        EventKind::Action {
            callback_id,
            payload,
        } => {
            let callback_id = callback_id.clone();
            match CallbackAction::decode(payload) {
                CallbackAction::Role(token) => Route::SelectRole { callback_id, token },
                CallbackAction::Block(token) => Route::OpenBlock { callback_id, token },
                CallbackAction::BackToMenu => Route::BackToMenu { callback_id },
                CallbackAction::Unrecognized(payload) => Route::UnrecognizedAction {
                    callback_id,
                    payload,
                },
            }
        }
        EventKind::Message { text } => match text.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => Route::UnknownText,
            _ => Route::Ignore,
        },
        EventKind::Lifecycle {
            kind: LifecycleKind::BotStarted,
            payload: Some(payload),
        } if !payload.is_empty() => Route::EchoStartPayload(payload.clone()),
        EventKind::Lifecycle { .. } => Route::Ignore,
    }
}
