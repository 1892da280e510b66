//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_BOT_TOKEN: &str = "dev-bot-token";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_WEBAPP_URL: &str = "http://localhost:5173";
pub const DEFAULT_MAX_API_URL: &str = "https://platform-api.max.ru";
pub const DEFAULT_UNIVERSITY_ID: i64 = 1;
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;

/// Which chat transport the bot runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// MAX Bot API long-polling.
    Max,
    /// stdin/stdout, for local runs.
    Cli,
}

impl std::str::FromStr for ChannelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "cli" => Ok(Self::Cli),
            other => Err(ConfigError::InvalidValue {
                key: "BOT_CHANNEL".to_string(),
                message: format!("unknown channel '{other}' (expected 'max' or 'cli')"),
            }),
        }
    }
}

/// Bot configuration, injected at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Messenger bot credential.
    pub bot_token: SecretString,
    /// Shared secret sent to the backend as `X-Bot-Secret`.
    pub bot_secret: Option<SecretString>,
    /// Backend base URL, without trailing slash.
    pub backend_url: String,
    /// Mini-app base URL, without trailing slash.
    pub webapp_url: String,
    /// University the role selection is recorded against.
    pub university_id: i64,
    /// Per-request timeout for backend calls.
    pub backend_timeout: Duration,
    pub channel: ChannelKind,
    /// MAX Bot API base URL.
    pub max_api_url: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: SecretString::from(DEFAULT_BOT_TOKEN),
            bot_secret: None,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            webapp_url: DEFAULT_WEBAPP_URL.to_string(),
            university_id: DEFAULT_UNIVERSITY_ID,
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            channel: ChannelKind::Max,
            max_api_url: DEFAULT_MAX_API_URL.to_string(),
        }
    }
}

impl BotConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset and empty keys fall back to the development defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let bot_token = get("BOT_TOKEN")
            .map(SecretString::from)
            .unwrap_or(defaults.bot_token);
        let bot_secret = get("BOT_SECRET").map(SecretString::from);

        let backend_url = get("BACKEND_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.backend_url);
        let webapp_url = get("WEBAPP_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.webapp_url);
        let max_api_url = get("MAX_API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.max_api_url);

        let university_id = match get("UNIVERSITY_ID") {
            Some(raw) => parse_number::<i64>("UNIVERSITY_ID", &raw)?,
            None => defaults.university_id,
        };

        let backend_timeout = match get("BACKEND_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number::<u64>("BACKEND_TIMEOUT_SECS", &raw)?),
            None => defaults.backend_timeout,
        };

        let channel = match get("BOT_CHANNEL") {
            Some(raw) => raw.parse()?,
            None => defaults.channel,
        };

        Ok(Self {
            bot_token,
            bot_secret,
            backend_url,
            webapp_url,
            university_id,
            backend_timeout,
            channel,
            max_api_url,
        })
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}': {e}"),
    })
}
