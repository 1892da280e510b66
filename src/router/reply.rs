//! Outbound instructions produced by the router.

use crate::menu::MenuDescriptor;

/// Text formatting hint for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Markdown,
    Html,
}

/// A chat message with an optional menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub menu: Option<MenuDescriptor>,
    pub format: Option<TextFormat>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            menu: None,
            format: None,
        }
    }

    pub fn with_menu(mut self, menu: MenuDescriptor) -> Self {
        self.menu = Some(menu);
        self
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// One thing for a channel to send, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// "Received" answer to a button press.
    Ack {
        callback_id: String,
        notification: Option<String>,
    },
    Reply(Reply),
}

impl Outbound {
    pub fn ack(callback_id: impl Into<String>, notification: Option<String>) -> Self {
        Self::Ack {
            callback_id: callback_id.into(),
            notification,
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Self::Ack { .. })
    }

    pub fn as_reply(&self) -> Option<&Reply> {
        match self {
            Self::Reply(reply) => Some(reply),
            Self::Ack { .. } => None,
        }
    }
}

impl From<Reply> for Outbound {
    fn from(reply: Reply) -> Self {
        Self::Reply(reply)
    }
}
