//! Error types for campus-bot.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures talking to the backend user-store.
///
/// These never reach the router: the `UserDirectory` boundary turns them
/// into "no data".
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("Backend returned {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("Invalid response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Channel health check failed: {name}")]
    HealthCheckFailed { name: String },
}
