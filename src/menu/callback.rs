//! Callback payload codec.
//!
//! Payloads are plain strings on the wire. They are decoded exactly once,
//! when an action event enters the router.

pub const ROLE_PREFIX: &str = "role_";
pub const BLOCK_PREFIX: &str = "block_";
pub const BACK_TO_MENU: &str = "back_to_menu";

/// A decoded button payload.
///
/// Tokens are kept verbatim: nothing here checks them against the closed
/// role or block sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// `role_<token>`: pick a role.
    Role(String),
    /// `block_<token>`: open a navigation block.
    Block(String),
    /// `back_to_menu`: return to the main menu.
    BackToMenu,
    /// Anything else, kept as received.
    Unrecognized(String),
}

impl CallbackAction {
    pub fn decode(payload: &str) -> Self {
        if payload == BACK_TO_MENU {
            return Self::BackToMenu;
        }
        if let Some(token) = payload.strip_prefix(ROLE_PREFIX).filter(|t| !t.is_empty()) {
            return Self::Role(token.to_string());
        }
        if let Some(token) = payload.strip_prefix(BLOCK_PREFIX).filter(|t| !t.is_empty()) {
            return Self::Block(token.to_string());
        }
        Self::Unrecognized(payload.to_string())
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Role(token) => format!("{ROLE_PREFIX}{token}"),
            Self::Block(token) => format!("{BLOCK_PREFIX}{token}"),
            Self::BackToMenu => BACK_TO_MENU.to_string(),
            Self::Unrecognized(raw) => raw.clone(),
        }
    }
}

impl std::fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}
