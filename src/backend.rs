//! Backend user-store client.
//!
//! The backend owns every user record. The bot only ever calls one endpoint,
//! `POST /api/bot/sync-user`, which creates or updates a record and returns
//! the current version of it.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::BotConfig;
use crate::error::BackendError;

const SYNC_USER_PATH: &str = "/api/bot/sync-user";
const SECRET_HEADER: &str = "X-Bot-Secret";

/// Body of a sync-user request. Absent fields are left unchanged by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncUserPayload {
    pub max_user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university_id: Option<i64>,
}

impl SyncUserPayload {
    pub fn new(max_user_id: i64) -> Self {
        Self {
            max_user_id,
            ..Default::default()
        }
    }
}

/// The authoritative user record returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub max_user_id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub university_id: Option<i64>,
}

impl UserInfo {
    /// The role token, if one is set and non-blank.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref().filter(|r| !r.trim().is_empty())
    }
}

/// Read/write access to user records.
///
/// Implementations never fail loudly: `None` means "no data", whatever the
/// reason was.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create or update a user and return the current record.
    async fn sync_user(&self, payload: &SyncUserPayload) -> Option<UserInfo>;

    /// Record a role selection.
    ///
    /// Success means the backend answered with a record. The echoed role is
    /// not compared with the requested one.
    async fn set_user_role(&self, user_id: i64, role: &str, university_id: i64) -> bool {
        let payload = SyncUserPayload {
            role: Some(role.to_string()),
            university_id: Some(university_id),
            ..SyncUserPayload::new(user_id)
        };
        self.sync_user(&payload).await.is_some()
    }
}

/// HTTP implementation of [`UserDirectory`].
pub struct BackendClient {
    base_url: String,
    secret: Option<SecretString>,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, secret: Option<SecretString>) -> Self {
        Self::with_client(base_url, secret, reqwest::Client::new())
    }

    pub fn with_client(
        base_url: impl Into<String>,
        secret: Option<SecretString>,
        client: reqwest::Client,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            secret,
            client,
        }
    }

    /// Build a client from bot configuration, applying the backend timeout.
    pub fn from_config(config: &BotConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .build()
            .map_err(|e| BackendError::Request {
                endpoint: config.backend_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self::with_client(
            config.backend_url.clone(),
            config.bot_secret.clone(),
            client,
        ))
    }

    fn sync_url(&self) -> String {
        format!("{}{SYNC_USER_PATH}", self.base_url)
    }

    /// Perform the sync call, reporting exactly what went wrong.
    pub async fn try_sync_user(&self, payload: &SyncUserPayload) -> Result<UserInfo, BackendError> {
        let endpoint = self.sync_url();

        let mut request = self.client.post(&endpoint).json(payload);
        if let Some(ref secret) = self.secret {
            request = request.header(SECRET_HEADER, secret.expose_secret());
        }

        let resp = request.send().await.map_err(|e| BackendError::Request {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        resp.json::<UserInfo>()
            .await
            .map_err(|e| BackendError::Decode {
                endpoint,
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl UserDirectory for BackendClient {
    async fn sync_user(&self, payload: &SyncUserPayload) -> Option<UserInfo> {
        match self.try_sync_user(payload).await {
            Ok(user) => {
                tracing::debug!(
                    user_id = payload.max_user_id,
                    role = user.role().unwrap_or("-"),
                    "User synced"
                );
                Some(user)
            }
            Err(e) => {
                tracing::warn!(user_id = payload.max_user_id, "Backend sync failed: {e}");
                None
            }
        }
    }
}
