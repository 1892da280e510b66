//! Role and block menus.
//!
//! Every function here is total. Unknown roles resolve to the student role,
//! and an unknown block yields the student main menu, so the user always has
//! something to press.

use crate::roles::{Block, Role};

use super::{CallbackAction, MenuAction, MenuDescriptor};

pub const OPEN_APP_LABEL: &str = "🚀 Открыть приложение";
pub const BACK_TO_MENU_LABEL: &str = "⬅️ Главное меню";

/// Builds menus against a fixed mini-app base URL.
#[derive(Debug, Clone)]
pub struct MenuBuilder {
    webapp_url: String,
}

impl MenuBuilder {
    pub fn new(webapp_url: impl Into<String>) -> Self {
        let webapp_url = webapp_url.into().trim_end_matches('/').to_string();
        Self { webapp_url }
    }

    /// `<base>?role=<role>`: lets the mini-app restore context without asking the backend.
    pub fn app_url(&self, role: Role) -> String {
        format!("{}?role={}", self.webapp_url, role)
    }

    /// `<base>/<path>`: a page inside the mini-app.
    pub fn page_url(&self, path: &str) -> String {
        format!("{}/{}", self.webapp_url, path.trim_start_matches('/'))
    }

    /// Main menu for a role token.
    pub fn role_menu(&self, role: &str) -> MenuDescriptor {
        self.menu_for_role(Role::resolve(role))
    }

    /// Main menu for a role: its blocks, then one final link to the mini-app.
    pub fn menu_for_role(&self, role: Role) -> MenuDescriptor {
        let menu = role_blocks(role)
            .iter()
            .fold(MenuDescriptor::new(), |menu, row| {
                menu.row(row.iter().map(|block| block_button(*block)).collect())
            });
        menu.single(self.open_app_button(role))
    }

    /// Menu for a block token. Unknown tokens get the student main menu.
    pub fn block_menu(&self, block: &str) -> MenuDescriptor {
        match Block::parse(block) {
            Some(block) => self.menu_for_block(block),
            None => self.menu_for_role(Role::default()),
        }
    }

    /// Block contents, then a single "back to main menu" row.
    pub fn menu_for_block(&self, block: Block) -> MenuDescriptor {
        let page = |label: &str, path: &str| MenuAction::link(label, self.page_url(path));

        let menu = match block {
            Block::Profile => MenuDescriptor::new()
                .single(page("📝 Мои данные", "profile"))
                .single(page("🎫 QR-пропуск", "pass")),
            Block::Schedule => MenuDescriptor::new()
                .row(vec![
                    page("📍 Сегодня", "schedule/today"),
                    page("🗓 Неделя", "schedule/week"),
                ])
                .single(page("📝 Сессия и экзамены", "schedule/exams")),
            Block::Lms => MenuDescriptor::new()
                .row(vec![
                    page("📚 Курсы", "lms/courses"),
                    page("✍️ Задания", "lms/assignments"),
                ])
                .single(page("🏅 Оценки", "lms/grades")),
            Block::Services => MenuDescriptor::new()
                .row(vec![
                    page("📄 Справки", "services/certificates"),
                    page("🏠 Общежитие", "services/dormitory"),
                ])
                .single(page("📚 Библиотека", "services/library"))
                .single(block_button(Block::Payment)),
            Block::Life => MenuDescriptor::new()
                .row(vec![
                    page("🎭 Мероприятия", "life/events"),
                    page("🤝 Клубы", "life/clubs"),
                ])
                .single(page("⚽ Спорт", "life/sports")),
            Block::Payment => MenuDescriptor::new()
                .single(page("💰 Оплата обучения", "payment/tuition"))
                .single(page("🧾 История платежей", "payment/history")),
            Block::Admission => MenuDescriptor::new()
                .row(vec![
                    page("🎓 Направления", "admission/programs"),
                    page("📨 Подать заявление", "admission/apply"),
                ])
                .single(page("🔎 Статус заявления", "admission/status"))
                .single(block_button(Block::News)),
            Block::News => MenuDescriptor::new()
                .single(page("🗞 Лента новостей", "news"))
                .single(page("📢 Объявления", "news/announcements")),
            Block::Analytics => MenuDescriptor::new()
                .single(page("📈 Дашборд", "analytics/dashboard"))
                .single(page("📑 Отчёты", "analytics/reports")),
            Block::Config => MenuDescriptor::new()
                .single(page("🏛 Университет", "config/university"))
                .single(page("🔌 Интеграции", "config/integrations")),
            Block::Users => MenuDescriptor::new()
                .single(page("📋 Список пользователей", "users"))
                .single(page("🛡 Роли и доступ", "users/roles")),
        };

        menu.single(back_button())
    }

    /// Onboarding menu: one button per self-selectable role.
    pub fn role_selection_menu(&self) -> MenuDescriptor {
        Role::ALL
            .iter()
            .filter(|role| role.is_self_selectable())
            .fold(MenuDescriptor::new(), |menu, role| {
                menu.single(MenuAction::callback(
                    role.label(),
                    &CallbackAction::Role(role.as_str().to_string()),
                ))
            })
    }

    /// A lone "open app" link for a role token.
    pub fn app_link_menu(&self, role: &str) -> MenuDescriptor {
        MenuDescriptor::new().single(self.open_app_button(Role::resolve(role)))
    }

    fn open_app_button(&self, role: Role) -> MenuAction {
        MenuAction::link(OPEN_APP_LABEL, self.app_url(role))
    }
}

/// Block layout of each role's main menu.
fn role_blocks(role: Role) -> &'static [&'static [Block]] {
    match role {
        Role::Student => &[
            &[Block::Profile, Block::Schedule],
            &[Block::Lms, Block::Services],
            &[Block::Life, Block::Payment],
        ],
        Role::Applicant => &[&[Block::Admission, Block::News], &[Block::Profile]],
        Role::Parent => &[
            &[Block::Schedule, Block::Payment],
            &[Block::News, Block::Profile],
        ],
        Role::Teacher => &[
            &[Block::Schedule, Block::Lms],
            &[Block::Services, Block::Profile],
        ],
        Role::Employee => &[&[Block::Services, Block::News], &[Block::Profile]],
        Role::Admin => &[
            &[Block::Analytics, Block::Users],
            &[Block::Config, Block::News],
        ],
    }
}

fn block_button(block: Block) -> MenuAction {
    MenuAction::callback(block.title(), &CallbackAction::Block(block.as_str().to_string()))
}

fn back_button() -> MenuAction {
    MenuAction::callback(BACK_TO_MENU_LABEL, &CallbackAction::BackToMenu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::callback::BACK_TO_MENU;

    const BASE: &str = "https://app.example.edu";

    fn builder() -> MenuBuilder {
        MenuBuilder::new(BASE)
    }

    /// Every menu the builder can produce for known inputs.
    fn all_menus(b: &MenuBuilder) -> Vec<MenuDescriptor> {
        let mut menus: Vec<MenuDescriptor> = Role::ALL.iter().map(|r| b.menu_for_role(*r)).collect();
        menus.extend(Block::ALL.iter().map(|bl| b.menu_for_block(*bl)));
        menus.push(b.role_selection_menu());
        menus.extend(Role::ALL.iter().map(|r| b.app_link_menu(r.as_str())));
        menus
    }

    #[test]
    fn role_menus_end_with_exactly_one_link() {
        let b = builder();
        for role in Role::ALL {
            let menu = b.role_menu(role.as_str());
            let links = menu.links();
            assert_eq!(links.len(), 1, "{role} menu should have one link");
            assert!(menu.last_action().is_some_and(MenuAction::is_link));
            assert_eq!(
                menu.last_action().and_then(MenuAction::url),
                Some(format!("{BASE}?role={role}").as_str())
            );
        }
    }

    #[test]
    fn block_menus_end_with_single_back_row() {
        let b = builder();
        for block in Block::ALL {
            let menu = b.block_menu(block.as_str());
            let last = menu.last_row().unwrap();
            assert_eq!(last.len(), 1, "{block} back row should be alone");
            assert_eq!(last[0].payload(), Some(BACK_TO_MENU));
            let back_count = menu
                .callback_payloads()
                .iter()
                .filter(|p| **p == BACK_TO_MENU)
                .count();
            assert_eq!(back_count, 1);
        }
    }

    #[test]
    fn unknown_role_is_student_menu() {
        let b = builder();
        assert_eq!(b.role_menu("dean"), b.role_menu("student"));
        assert_eq!(b.role_menu(""), b.role_menu("student"));
    }

    #[test]
    fn unknown_block_is_student_role_menu() {
        let b = builder();
        assert_eq!(b.block_menu("cafeteria"), b.role_menu("student"));
        assert_eq!(b.block_menu(""), b.role_menu("student"));
    }

    #[test]
    fn every_callback_payload_is_routable() {
        let b = builder();
        for menu in all_menus(&b) {
            for payload in menu.callback_payloads() {
                let action = CallbackAction::decode(payload);
                match action {
                    CallbackAction::Role(ref token) => assert!(Role::parse(token).is_some()),
                    CallbackAction::Block(ref token) => assert!(Block::parse(token).is_some()),
                    CallbackAction::BackToMenu => {}
                    CallbackAction::Unrecognized(raw) => panic!("dangling button payload: {raw}"),
                }
            }
        }
    }

    #[test]
    fn role_menu_buttons_use_block_titles() {
        let menu = builder().menu_for_role(Role::Applicant);
        let first = &menu.rows[0][0];
        assert_eq!(first.label(), Block::Admission.title());
        assert_eq!(first.payload(), Some("block_admission"));
    }

    #[test]
    fn block_links_point_into_the_app() {
        let b = builder();
        let menu = b.menu_for_block(Block::Schedule);
        let urls: Vec<&str> = menu.actions().filter_map(MenuAction::url).collect();
        assert!(urls.contains(&"https://app.example.edu/schedule/today"));
        assert!(urls.iter().all(|u| u.starts_with("https://app.example.edu/")));
    }

    #[test]
    fn role_selection_offers_every_self_selectable_role() {
        let menu = builder().role_selection_menu();
        let payloads = menu.callback_payloads();
        assert_eq!(payloads.len(), 5);
        assert!(payloads.contains(&"role_student"));
        assert!(!payloads.contains(&"role_admin"));
        assert!(menu.links().is_empty());
    }

    #[test]
    fn app_link_menu_is_a_single_link() {
        let menu = builder().app_link_menu("teacher");
        assert_eq!(menu.rows.len(), 1);
        assert_eq!(
            menu.last_action().and_then(MenuAction::url),
            Some("https://app.example.edu?role=teacher")
        );
    }

    #[test]
    fn base_url_is_normalized() {
        let b = MenuBuilder::new("https://app.example.edu/");
        assert_eq!(b.page_url("/news"), "https://app.example.edu/news");
        assert_eq!(b.app_url(Role::Parent), "https://app.example.edu?role=parent");
    }
}
