//! Per-endpoint call options.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use yar_protocol::MAGIC_NUMBER;
use yar_transport::SendOptions;

/// Default call timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default packager name.
pub const DEFAULT_PACKAGER: &str = "json";

/// Settings applied to every call made through one [`Client`](crate::Client).
///
/// Set once per endpoint and reused; the call path only reads it.
/// `#[serde(default)]` lets a config file name just the fields it changes:
///
/// ```rust
/// use yar_client::Options;
///
/// let options: Options =
///     serde_json::from_str(r#"{"provider":"svcA","timeout_ms":2000}"#).unwrap();
/// assert_eq!(options.provider, "svcA");
/// assert_eq!(options.packager, "json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Caller identity, sent in a 28-byte header field.
    pub provider: String,

    /// Service credential, sent in a 32-byte header field.
    pub credential: String,

    /// Protocol tag; must match the peer.
    pub magic_number: u32,

    /// Codec name. Only the first eight bytes reach the wire and select
    /// the codec, so `"msgpack-v2"` behaves exactly like `"msgpack-"`.
    pub packager: String,

    /// Deadline for the whole exchange, in milliseconds.
    pub timeout_ms: u64,

    /// Gzip the request body.
    pub request_gzip: bool,

    /// Accept a gzip response body.
    pub accept_gzip: bool,

    /// Dial through the caching resolver instead of the system one.
    pub dns_cache: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            provider: String::new(),
            credential: String::new(),
            magic_number: MAGIC_NUMBER,
            packager: DEFAULT_PACKAGER.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            request_gzip: false,
            accept_gzip: false,
            dns_cache: false,
        }
    }
}

impl Options {
    /// Creates options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = credential.into();
        self
    }

    pub fn with_magic_number(mut self, magic_number: u32) -> Self {
        self.magic_number = magic_number;
        self
    }

    pub fn with_packager(mut self, packager: impl Into<String>) -> Self {
        self.packager = packager.into();
        self
    }

    /// Sets the deadline (millisecond precision).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_request_gzip(mut self, enabled: bool) -> Self {
        self.request_gzip = enabled;
        self
    }

    pub fn with_accept_gzip(mut self, enabled: bool) -> Self {
        self.accept_gzip = enabled;
        self
    }

    pub fn with_dns_cache(mut self, enabled: bool) -> Self {
        self.dns_cache = enabled;
        self
    }

    /// The deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The transport settings for one call.
    pub fn send_options(&self) -> SendOptions {
        SendOptions {
            timeout: self.timeout(),
            request_gzip: self.request_gzip,
            accept_gzip: self.accept_gzip,
            dns_cache: self.dns_cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.magic_number, 0x80DF_EC60);
        assert_eq!(options.packager, "json");
        assert_eq!(options.timeout(), Duration::from_millis(5000));
        assert!(!options.request_gzip);
        assert!(!options.accept_gzip);
        assert!(!options.dns_cache);
        assert!(options.provider.is_empty());
    }

    #[test]
    fn test_setters_chain() {
        let options = Options::new()
            .with_provider("svcA")
            .with_credential("tokenX")
            .with_packager("msgpack")
            .with_timeout(Duration::from_millis(2000))
            .with_request_gzip(true)
            .with_accept_gzip(true)
            .with_dns_cache(true);
        assert_eq!(options.provider, "svcA");
        assert_eq!(options.credential, "tokenX");
        assert_eq!(options.packager, "msgpack");
        assert_eq!(options.timeout_ms, 2000);

        let send = options.send_options();
        assert_eq!(send.timeout, Duration::from_secs(2));
        assert!(send.request_gzip && send.accept_gzip && send.dns_cache);
    }

    #[test]
    fn test_partial_config_document_keeps_defaults() {
        let options: Options =
            serde_json::from_str(r#"{"dns_cache":true}"#).unwrap();
        assert!(options.dns_cache);
        assert_eq!(options.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(options.magic_number, MAGIC_NUMBER);
    }
}
