use std::time::Duration;

/// Errors raised while polling the registry or touching the host store.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// A required setting (registry URL, store) is missing.
    #[error("not configured: {0}")]
    NotConfigured(&'static str),

    /// The registry did not answer within its deadline.
    #[error("registry timed out after {0:?}")]
    Timeout(Duration),

    /// The registry could not be reached or answered badly.
    #[error("registry request failed: {0}")]
    Registry(String),

    /// A container listing or stored host list was not valid JSON.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// The host store rejected a read or write.
    #[error("host store failed: {0}")]
    Store(String),

    /// The Redis host store could not connect or run a command.
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
}
