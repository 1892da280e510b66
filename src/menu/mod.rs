//! Transport-agnostic menus.
//!
//! A menu is rows of buttons. Channels decide how to draw them.

pub mod builder;
pub mod callback;

pub use builder::MenuBuilder;
pub use callback::CallbackAction;

/// One button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Re-enters the router as an action event carrying `payload`.
    Callback { label: String, payload: String },
    /// Opens an external URL. Produces no router event.
    Link { label: String, url: String },
}

impl MenuAction {
    pub fn callback(label: impl Into<String>, action: &CallbackAction) -> Self {
        Self::Callback {
            label: label.into(),
            payload: action.encode(),
        }
    }

    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Link {
            label: label.into(),
            url: url.into(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Callback { label, .. } | Self::Link { label, .. } => label,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Self::Link { .. })
    }

    /// Callback payload, if this is a callback button.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Callback { payload, .. } => Some(payload),
            Self::Link { .. } => None,
        }
    }

    /// Link URL, if this is a link button.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Link { url, .. } => Some(url),
            Self::Callback { .. } => None,
        }
    }
}

/// Ordered rows of ordered buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuDescriptor {
    pub rows: Vec<Vec<MenuAction>>,
}

impl MenuDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row. Empty rows are dropped.
    pub fn row(mut self, actions: Vec<MenuAction>) -> Self {
        if !actions.is_empty() {
            self.rows.push(actions);
        }
        self
    }

    /// Append a row holding a single button.
    pub fn single(self, action: MenuAction) -> Self {
        self.row(vec![action])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All buttons, row by row.
    pub fn actions(&self) -> impl Iterator<Item = &MenuAction> {
        self.rows.iter().flatten()
    }

    pub fn last_row(&self) -> Option<&[MenuAction]> {
        self.rows.last().map(Vec::as_slice)
    }

    pub fn last_action(&self) -> Option<&MenuAction> {
        self.rows.last().and_then(|row| row.last())
    }

    /// Every callback payload in the menu.
    pub fn callback_payloads(&self) -> Vec<&str> {
        self.actions().filter_map(MenuAction::payload).collect()
    }

    /// Every link button in the menu.
    pub fn links(&self) -> Vec<&MenuAction> {
        self.actions().filter(|a| a.is_link()).collect()
    }
}
