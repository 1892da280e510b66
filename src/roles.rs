//! Role and navigation-block naming.
//!
//! Both sets are closed. Anything outside them is carried around as a raw
//! token and resolved to a default at the point where a menu is built.

/// Label shown for a user who has not picked a role yet.
pub const UNSET_ROLE_LABEL: &str = "не выбрана";

/// The caller's persona, as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Parent,
    Applicant,
    Student,
    Teacher,
    Employee,
    Admin,
}

impl Role {
    /// Every role, in the order they are offered during onboarding.
    pub const ALL: [Role; 6] = [
        Role::Applicant,
        Role::Student,
        Role::Parent,
        Role::Teacher,
        Role::Employee,
        Role::Admin,
    ];

    /// Parse a wire token (`"student"`, `"admin"`, ...). Exact match only.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "parent" => Some(Self::Parent),
            "applicant" => Some(Self::Applicant),
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            "employee" => Some(Self::Employee),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Resolve a token, falling back to the default role for anything unknown.
    pub fn resolve(token: &str) -> Self {
        Self::parse(token).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Applicant => "applicant",
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Employee => "employee",
            Self::Admin => "admin",
        }
    }

    /// Whether users may pick this role for themselves during onboarding.
    pub fn is_self_selectable(&self) -> bool {
        !matches!(self, Self::Admin)
    }

    /// Human-readable label used on buttons and in the profile summary.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Parent => "👨‍👩‍👧 Родитель",
            Self::Applicant => "🎓 Абитуриент",
            Self::Student => "📚 Студент",
            Self::Teacher => "👨‍🏫 Преподаватель",
            Self::Employee => "💼 Сотрудник",
            Self::Admin => "⚙️ Администратор",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Student
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Describe a role token as stored by the backend.
///
/// Known tokens get their label, unknown ones are shown verbatim.
pub fn describe_role(token: Option<&str>) -> &str {
    match token {
        None => UNSET_ROLE_LABEL,
        Some(t) if t.trim().is_empty() => UNSET_ROLE_LABEL,
        Some(t) => Role::parse(t).map(|r| r.label()).unwrap_or(t),
    }
}

/// A navigation category grouping related actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    Profile,
    Schedule,
    Lms,
    Services,
    Life,
    Payment,
    Admission,
    News,
    Analytics,
    Config,
    Users,
}

impl Block {
    pub const ALL: [Block; 11] = [
        Block::Profile,
        Block::Schedule,
        Block::Lms,
        Block::Services,
        Block::Life,
        Block::Payment,
        Block::Admission,
        Block::News,
        Block::Analytics,
        Block::Config,
        Block::Users,
    ];

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "profile" => Some(Self::Profile),
            "schedule" => Some(Self::Schedule),
            "lms" => Some(Self::Lms),
            "services" => Some(Self::Services),
            "life" => Some(Self::Life),
            "payment" => Some(Self::Payment),
            "admission" => Some(Self::Admission),
            "news" => Some(Self::News),
            "analytics" => Some(Self::Analytics),
            "config" => Some(Self::Config),
            "users" => Some(Self::Users),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Schedule => "schedule",
            Self::Lms => "lms",
            Self::Services => "services",
            Self::Life => "life",
            Self::Payment => "payment",
            Self::Admission => "admission",
            Self::News => "news",
            Self::Analytics => "analytics",
            Self::Config => "config",
            Self::Users => "users",
        }
    }

    /// Title used both on the button that opens the block and above its menu.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Profile => "👤 Профиль",
            Self::Schedule => "📅 Расписание",
            Self::Lms => "📖 Обучение",
            Self::Services => "🛎 Сервисы",
            Self::Life => "🎉 Студенческая жизнь",
            Self::Payment => "💳 Оплата",
            Self::Admission => "📝 Поступление",
            Self::News => "📰 Новости",
            Self::Analytics => "📊 Аналитика",
            Self::Config => "🔧 Настройки",
            Self::Users => "👥 Пользователи",
        }
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tokens_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn role_parse_is_exact() {
        assert_eq!(Role::parse("Student"), None);
        assert_eq!(Role::parse(" student"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn unknown_role_resolves_to_student() {
        assert_eq!(Role::resolve("dean"), Role::Student);
        assert_eq!(Role::resolve("admin"), Role::Admin);
    }

    #[test]
    fn block_tokens_round_trip() {
        for block in Block::ALL {
            assert_eq!(Block::parse(block.as_str()), Some(block));
        }
    }

    #[test]
    fn admin_is_not_self_selectable() {
        assert!(!Role::Admin.is_self_selectable());
        assert!(Role::Student.is_self_selectable());
    }

    #[test]
    fn schedule_title() {
        assert_eq!(Block::Schedule.title(), "📅 Расписание");
    }

    #[test]
    fn describe_role_variants() {
        assert_eq!(describe_role(None), UNSET_ROLE_LABEL);
        assert_eq!(describe_role(Some("  ")), UNSET_ROLE_LABEL);
        assert_eq!(describe_role(Some("teacher")), "👨‍🏫 Преподаватель");
        assert_eq!(describe_role(Some("rector")), "rector");
    }
}
