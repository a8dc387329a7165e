//! A [`HostStore`] backed by a Redis server, which is where Yar callers
//! normally look up published host lists.

use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, IntoConnectionInfo, SetExpiry, SetOptions};
use serde::{Deserialize, Serialize};

use crate::DiscoveryError;
use crate::store::HostStore;

/// Settings for [`RedisHostStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Server URL, e.g. `redis://10.0.0.5:6379`.
    pub url: String,

    /// Logical database holding the host lists.
    pub db: i64,

    /// Deadline for establishing a connection, in milliseconds.
    pub connection_timeout_ms: u64,

    /// Deadline for one command's reply, in milliseconds.
    pub response_timeout_ms: u64,

    /// Reconnect attempts before a command fails.
    pub retries: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            db: 7,
            connection_timeout_ms: 10_000,
            response_timeout_ms: 10_000,
            retries: 3,
        }
    }
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// Host lists in Redis, one string key per service written with `SET EX`.
///
/// The connection is shared and re-established in the background when it
/// drops, so one store can serve every sync pass of a process.
#[derive(Clone)]
pub struct RedisHostStore {
    conn: ConnectionManager,
}

impl RedisHostStore {
    /// Connects to the configured server and selects its database.
    ///
    /// # Errors
    /// [`DiscoveryError::NotConfigured`] when `url` is empty, or
    /// [`DiscoveryError::Redis`] if the URL is invalid or the server
    /// cannot be reached within the configured retries.
    pub async fn connect(config: &RedisConfig) -> Result<Self, DiscoveryError> {
        if config.url.is_empty() {
            return Err(DiscoveryError::NotConfigured("redis url"));
        }
        let mut info = config.url.as_str().into_connection_info()?;
        info.redis.db = config.db;

        let manager = ConnectionManagerConfig::new()
            .set_number_of_retries(config.retries)
            .set_connection_timeout(config.connection_timeout())
            .set_response_timeout(config.response_timeout());
        let conn = redis::Client::open(info)?
            .get_connection_manager_with_config(manager)
            .await?;
        tracing::debug!(db = config.db, "redis host store connected");
        Ok(Self { conn })
    }
}

impl HostStore for RedisHostStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DiscoveryError> {
        let mut conn = self.conn.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    /// Expiries under one second are rounded up; Redis rejects `EX 0`.
    async fn set(
        &self,
        key: &str,
        value: String,
        expiry: Duration,
    ) -> Result<(), DiscoveryError> {
        let options =
            SetOptions::default().with_expiration(SetExpiry::EX(expiry.as_secs().max(1)));
        let mut conn = self.conn.clone();
        conn.set_options::<_, _, ()>(key, value, options).await?;
        Ok(())
    }
}
