//! Transport layer for Yar.
//!
//! Provides the [`Transport`] trait, which moves one request frame to the
//! peer and brings the whole reply back, and the implementations behind
//! each address [`Scheme`]:
//!
//! - `http` / `https`: [`HttpTransport`], with optional gzip in both
//!   directions and an optional DNS-cache dialer ([`Resolver`]).
//! - `tcp` / `udp` / `unix`: [`SocketTransport`], an explicit stub that
//!   refuses every send.
//!
//! Everything about a single call (deadline, compression, which handle)
//! is passed in [`SendOptions`]; transports keep no per-call state.

#![allow(async_fn_in_trait)]

mod error;
pub mod gzip;
mod http;
mod resolver;
mod socket;

pub use error::TransportError;
pub use http::{HttpConfig, HttpTransport};
pub use resolver::{
    CachingResolver, DEFAULT_DNS_TTL, Resolver, pick_first,
};
pub use socket::SocketTransport;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The scheme of a client address (`http://...`, `tcp://...`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    Tcp,
    Udp,
    Unix,
}

impl Scheme {
    /// Reads the scheme from the front of an address.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidAddress`] if there is no
    /// `scheme://` prefix or the scheme is not one of the five known ones.
    pub fn of_address(addr: &str) -> Result<Self, TransportError> {
        let (scheme, rest) = addr.split_once("://").ok_or_else(|| {
            TransportError::InvalidAddress(format!("{addr:?} has no scheme"))
        })?;
        if rest.is_empty() {
            return Err(TransportError::InvalidAddress(format!(
                "{addr:?} has no host"
            )));
        }
        scheme.parse()
    }

    /// Returns `true` for the schemes with a working transport.
    pub fn is_http(self) -> bool {
        matches!(self, Self::Http | Self::Https)
    }

    /// The lowercase scheme name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Unix => "unix",
        }
    }
}

impl FromStr for Scheme {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "unix" => Ok(Self::Unix),
            other => Err(TransportError::InvalidAddress(format!(
                "unknown scheme {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call transport settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// Deadline for the whole exchange (connect, send, receive).
    pub timeout: Duration,
    /// Gzip the outgoing body.
    pub request_gzip: bool,
    /// Tell the peer a gzip response is acceptable.
    pub accept_gzip: bool,
    /// Dial through the DNS-cache handle.
    pub dns_cache: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            request_gzip: false,
            accept_gzip: false,
            dns_cache: false,
        }
    }
}

/// Moves one request frame to the peer and returns the whole reply.
pub trait Transport: Send + Sync + 'static {
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends `payload` to `endpoint` and waits for the complete response
    /// body, bounded by `options.timeout`.
    async fn send(
        &self,
        endpoint: &str,
        payload: Vec<u8>,
        options: &SendOptions,
    ) -> Result<Vec<u8>, Self::Error>;
}
