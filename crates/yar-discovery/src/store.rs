//! Where published host lists live.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::DiscoveryError;

/// Prefix of every key this crate writes.
pub const KEY_PREFIX: &str = "__yar_host_sync__:";

/// How long a published list stays readable without a refresh.
pub const HOST_LIST_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// The store key for one service of one group.
pub fn store_key(group: &str, service: &str) -> String {
    format!("{KEY_PREFIX}{group}:{service}")
}

/// A shared key-value store with per-key expiry.
///
/// Callers resolve service hosts by reading it, so any store that other
/// processes can see (a Redis-like server) fits behind this trait.
pub trait HostStore: Send + Sync {
    /// Reads a live value.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, DiscoveryError>> + Send;

    /// Writes `value`, readable until `expiry` has passed.
    fn set(
        &self,
        key: &str,
        value: String,
        expiry: Duration,
    ) -> impl Future<Output = Result<(), DiscoveryError>> + Send;
}

struct Entry {
    value: String,
    expires: Instant,
}

fn prune(entries: &mut HashMap<String, Entry>, now: Instant) {
    entries.retain(|_, entry| entry.expires > now);
}

/// An in-process [`HostStore`].
///
/// Expired keys are dropped on every write and every [`len`](Self::len),
/// not only when the key itself is read.
#[derive(Default)]
pub struct MemoryHostStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryHostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |mut entries| {
            prune(&mut entries, Instant::now());
            entries.len()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HostStore for MemoryHostStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DiscoveryError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| DiscoveryError::Store("lock poisoned".into()))?;
        match entries.get(key) {
            Some(entry) if entry.expires > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        expiry: Duration,
    ) -> Result<(), DiscoveryError> {
        let now = Instant::now();
        let expires = now
            .checked_add(expiry)
            .ok_or_else(|| DiscoveryError::Store(format!("expiry {expiry:?} out of range")))?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| DiscoveryError::Store("lock poisoned".into()))?;
        prune(&mut entries, now);
        entries.insert(key.to_string(), Entry { value, expires });
        Ok(())
    }
}
