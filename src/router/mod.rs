//! Role-aware conversational router.
//!
//! The router holds no per-user state. Every decision is re-derived from the
//! event itself plus, when a handler needs it, one fresh backend lookup.

pub mod event;
pub mod reply;
pub mod route;

pub use event::{Caller, Event, EventKind, LifecycleKind};
pub use reply::{Outbound, Reply, TextFormat};
pub use route::{Route, classify};

use std::sync::Arc;

use crate::backend::{SyncUserPayload, UserDirectory, UserInfo};
use crate::config::BotConfig;
use crate::menu::MenuBuilder;
use crate::roles::{Block, Role, describe_role};

pub const NO_IDENTITY_TEXT: &str =
    "😔 Не удалось определить пользователя. Попробуйте ещё раз чуть позже.";

pub const CHOOSE_ROLE_TEXT: &str =
    "👋 Добро пожаловать в университетский бот!\n\nЧтобы продолжить, выберите вашу роль:";

pub const OPEN_APP_TEXT: &str = "Откройте мини-приложение, чтобы продолжить:";

pub const MAIN_MENU_TITLE: &str = "📋 Главное меню";

pub const NOT_REGISTERED_TEXT: &str =
    "⚠️ Вы ещё не зарегистрированы.\n\nОтправьте /start, чтобы начать.";

pub const UNKNOWN_COMMAND_TEXT: &str = "🤔 Я не знаю такой команды.\n\n\
     Используйте /help, чтобы посмотреть список команд, или /start, чтобы открыть главное меню.";

pub const ROLE_SAVE_FAILED_TEXT: &str =
    "⚠️ Не удалось сохранить роль. Вы всё равно можете открыть приложение:";

pub const HELP_TEXT: &str = "**Университетский бот**\n\n\
     /start — главное меню и выбор роли\n\
     /profile — ваш профиль\n\
     /schedule — расписание\n\
     /services — сервисы университета\n\
     /news — новости\n\
     /payment — оплата\n\
     /help — эта справка\n\n\
     Большинство разделов открываются в мини-приложении.";

/// Turns events into outbound messages.
pub struct EventRouter {
    users: Arc<dyn UserDirectory>,
    menus: MenuBuilder,
    university_id: i64,
}

impl EventRouter {
    pub fn new(users: Arc<dyn UserDirectory>, menus: MenuBuilder, university_id: i64) -> Self {
        Self {
            users,
            menus,
            university_id,
        }
    }

    pub fn from_config(users: Arc<dyn UserDirectory>, config: &BotConfig) -> Self {
        Self::new(
            users,
            MenuBuilder::new(config.webapp_url.clone()),
            config.university_id,
        )
    }

    pub fn menus(&self) -> &MenuBuilder {
        &self.menus
    }

    /// Handle one event.
    ///
    /// For action events the acknowledgement always comes first, exactly
    /// once. Never fails: backend trouble degrades to the documented
    /// fallbacks.
    pub async fn handle(&self, event: &Event) -> Vec<Outbound> {
        let route = classify(&event.kind);
        tracing::debug!(
            event = %event.describe(),
            user_id = ?event.caller.user_id,
            route = ?route,
            "Routing event"
        );

        let user_id = match event.caller.user_id {
            Some(id) => id,
            None if route.needs_identity() => {
                tracing::warn!(event = %event.describe(), "Event has no user id");
                let mut out = ack_for(&route, None);
                out.push(Reply::text(NO_IDENTITY_TEXT).into());
                return out;
            }
            // Not needed by this route.
            None => 0,
        };

        match route {
            Route::Start => self.on_start(&event.caller, user_id).await,
            Route::Help => vec![Reply::text(HELP_TEXT).with_format(TextFormat::Markdown).into()],
            Route::Schedule => vec![self.block_reply(Block::Schedule.as_str()).into()],
            Route::Profile => self.on_profile(&event.caller, user_id).await,
            Route::SelectRole {
                ref callback_id,
                ref token,
            } => self.on_select_role(callback_id, user_id, token).await,
            Route::OpenBlock {
                ref callback_id,
                ref token,
            } => vec![
                Outbound::ack(callback_id.as_str(), None),
                self.block_reply(token).into(),
            ],
            Route::BackToMenu { ref callback_id } => {
                let mut out = vec![Outbound::ack(callback_id.as_str(), None)];
                out.push(self.on_back_to_menu(&event.caller, user_id).await.into());
                out
            }
            Route::UnrecognizedAction {
                ref callback_id,
                ref payload,
            } => {
                tracing::debug!(payload = %payload, "Ignoring unrecognized button payload");
                vec![Outbound::ack(callback_id.as_str(), None)]
            }
            Route::EchoStartPayload(payload) => {
                vec![Reply::text(format!("🔗 Параметр запуска: {payload}")).into()]
            }
            Route::UnknownCommand | Route::UnknownText => {
                vec![Reply::text(UNKNOWN_COMMAND_TEXT).into()]
            }
            Route::Ignore => Vec::new(),
        }
    }

    async fn on_start(&self, caller: &Caller, user_id: i64) -> Vec<Outbound> {
        let user = self.users.sync_user(&sync_payload(caller, user_id)).await;

        match user.as_ref().and_then(UserInfo::role) {
            None => vec![
                Reply::text(CHOOSE_ROLE_TEXT)
                    .with_menu(self.menus.role_selection_menu())
                    .into(),
            ],
            Some(role) => {
                let greeting = match user.as_ref().and_then(|u| u.first_name.as_deref()) {
                    Some(name) if !name.trim().is_empty() => {
                        format!("👋 С возвращением, {}!\n\n{OPEN_APP_TEXT}", name.trim())
                    }
                    _ => format!("👋 С возвращением!\n\n{OPEN_APP_TEXT}"),
                };
                vec![
                    Reply::text(greeting)
                        .with_menu(self.menus.app_link_menu(role))
                        .into(),
                    self.main_menu_reply(role).into(),
                ]
            }
        }
    }

    async fn on_profile(&self, caller: &Caller, user_id: i64) -> Vec<Outbound> {
        match self.users.sync_user(&sync_payload(caller, user_id)).await {
            Some(user) => vec![
                Reply::text(profile_summary(&user))
                    .with_menu(self.menus.block_menu(Block::Profile.as_str()))
                    .into(),
            ],
            None => vec![Reply::text(NOT_REGISTERED_TEXT).into()],
        }
    }

    async fn on_select_role(&self, callback_id: &str, user_id: i64, token: &str) -> Vec<Outbound> {
        let saved = self
            .users
            .set_user_role(user_id, token, self.university_id)
            .await;
        let label = describe_role(Some(token));

        let (notification, text) = if saved {
            tracing::info!(user_id, role = token, "Role selected");
            (
                format!("Роль выбрана: {label}"),
                format!("✅ Ваша роль: {label}\n\n{OPEN_APP_TEXT}"),
            )
        } else {
            (
                "Не удалось сохранить роль".to_string(),
                ROLE_SAVE_FAILED_TEXT.to_string(),
            )
        };

        vec![
            Outbound::ack(callback_id, Some(notification)),
            Reply::text(text)
                .with_menu(self.menus.app_link_menu(token))
                .into(),
        ]
    }

    async fn on_back_to_menu(&self, caller: &Caller, user_id: i64) -> Reply {
        let user = self.users.sync_user(&sync_payload(caller, user_id)).await;
        let role = user
            .as_ref()
            .and_then(UserInfo::role)
            .unwrap_or(Role::default().as_str());
        self.main_menu_reply(role)
    }

    fn main_menu_reply(&self, role: &str) -> Reply {
        Reply::text(format!("{MAIN_MENU_TITLE}\n\nРоль: {}", describe_role(Some(role))))
            .with_menu(self.menus.role_menu(role))
    }

    /// Block menu titled after the block. Unknown tokens get the main menu title.
    fn block_reply(&self, token: &str) -> Reply {
        let title = Block::parse(token)
            .map(|b| b.title())
            .unwrap_or(MAIN_MENU_TITLE);
        Reply::text(format!("{title}\n\nВыберите раздел:")).with_menu(self.menus.block_menu(token))
    }
}

fn ack_for(route: &Route, notification: Option<String>) -> Vec<Outbound> {
    route
        .callback_id()
        .map(|id| Outbound::ack(id, notification))
        .into_iter()
        .collect()
}

/// Sync payload carrying everything the transport told us about the caller.
fn sync_payload(caller: &Caller, user_id: i64) -> SyncUserPayload {
    SyncUserPayload {
        first_name: caller.first_name.clone(),
        last_name: caller.last_name.clone(),
        username: caller.username.clone(),
        ..SyncUserPayload::new(user_id)
    }
}

fn profile_summary(user: &UserInfo) -> String {
    let name = event::join_name(user.first_name.as_deref(), user.last_name.as_deref())
        .unwrap_or_else(|| "—".to_string());
    let mut lines = vec![
        "👤 Ваш профиль".to_string(),
        String::new(),
        format!("Имя: {name}"),
    ];
    if let Some(username) = user.username.as_deref().filter(|u| !u.is_empty()) {
        lines.push(format!("Username: @{username}"));
    }
    lines.push(format!("Роль: {}", describe_role(user.role())));
    lines.push(format!("ID: {}", user.max_user_id));
    lines.join("\n")
}
