//! Host name resolution for the DNS-cache HTTP handle.
//!
//! The DNS-cache handle never asks the system resolver directly. Every
//! dial goes through a [`Resolver`], and only the first address it returns
//! is used, on the port from the request URL. There is no round-robin and
//! no health checking; an empty answer fails the dial before any
//! connection attempt.

use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::dns::{Addrs, Name, Resolve, Resolving};

use crate::TransportError;

/// Resolves a host name to its addresses.
///
/// Implementations may cache; the order of the returned list matters
/// because callers only dial the first entry.
pub trait Resolver: Send + Sync + 'static {
    /// Looks up `host`, returning its addresses in preference order.
    fn lookup(
        &self,
        host: &str,
    ) -> impl Future<Output = Result<Vec<IpAddr>, TransportError>> + Send;
}

/// Picks the address the DNS-cache handle dials.
pub fn pick_first(host: &str, addrs: &[IpAddr]) -> Result<IpAddr, TransportError> {
    addrs
        .first()
        .copied()
        .ok_or_else(|| TransportError::Lookup(format!("no address found for {host}")))
}

// ---------------------------------------------------------------------------
// CachingResolver
// ---------------------------------------------------------------------------

/// Default time a lookup result stays cached.
pub const DEFAULT_DNS_TTL: Duration = Duration::from_secs(60);

struct CacheEntry {
    addrs: Vec<IpAddr>,
    fetched: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched.elapsed() < ttl
    }
}

/// A [`Resolver`] that caches system lookups per host for a fixed TTL.
///
/// Empty answers and failures are never cached. Expired entries are
/// dropped when their host is looked up again and whenever a new answer
/// is stored.
pub struct CachingResolver {
    ttl: Duration,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl CachingResolver {
    /// Creates a resolver whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of hosts currently held, fresh or not yet pruned.
    pub fn len(&self) -> usize {
        self.cache.lock().map_or(0, |cache| cache.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, host: &str) -> Option<Vec<IpAddr>> {
        let mut cache = self.cache.lock().ok()?;
        let entry = cache.get(host)?;
        if entry.is_fresh(self.ttl) {
            return Some(entry.addrs.clone());
        }
        cache.remove(host);
        None
    }

    fn remember(&self, host: &str, addrs: &[IpAddr]) {
        if addrs.is_empty() {
            return;
        }
        if let Ok(mut cache) = self.cache.lock() {
            cache.retain(|_, entry| entry.is_fresh(self.ttl));
            cache.insert(
                host.to_string(),
                CacheEntry {
                    addrs: addrs.to_vec(),
                    fetched: Instant::now(),
                },
            );
        }
    }
}

impl Default for CachingResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DNS_TTL)
    }
}

impl Resolver for CachingResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, TransportError> {
        if let Some(addrs) = self.cached(host) {
            tracing::trace!(host, "dns cache hit");
            return Ok(addrs);
        }

        let mut addrs: Vec<IpAddr> = Vec::new();
        let found = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| TransportError::Lookup(format!("{host}: {e}")))?;
        for addr in found {
            if !addrs.contains(&addr.ip()) {
                addrs.push(addr.ip());
            }
        }

        tracing::debug!(host, count = addrs.len(), "dns lookup");
        self.remember(host, &addrs);
        Ok(addrs)
    }
}

// ---------------------------------------------------------------------------
// reqwest adapter
// ---------------------------------------------------------------------------

/// Resolves `host` and returns the single socket address to dial.
///
/// The port is left at zero; the HTTP connector fills in the port from
/// the request URL.
pub(crate) async fn resolve_first<R: Resolver>(
    resolver: &R,
    host: &str,
) -> Result<SocketAddr, TransportError> {
    let addrs = resolver.lookup(host).await?;
    let first = pick_first(host, &addrs)?;
    if addrs.len() > 1 {
        tracing::trace!(host, %first, skipped = addrs.len() - 1, "dialing first address only");
    }
    Ok(SocketAddr::new(first, 0))
}

/// Plugs a [`Resolver`] into `reqwest`'s connector.
pub(crate) struct DnsCacheResolve<R> {
    inner: Arc<R>,
}

impl<R> DnsCacheResolve<R> {
    pub(crate) fn new(inner: Arc<R>) -> Self {
        Self { inner }
    }
}

impl<R: Resolver> Resolve for DnsCacheResolve<R> {
    fn resolve(&self, name: Name) -> Resolving {
        let inner = Arc::clone(&self.inner);
        let host = name.as_str().to_string();
        Box::pin(async move {
            let addr = resolve_first(inner.as_ref(), &host).await?;
            let addrs: Addrs = Box::new(std::iter::once(addr));
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}
