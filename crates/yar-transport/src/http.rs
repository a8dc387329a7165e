//! HTTP transport built on `reqwest`.
//!
//! An [`HttpTransport`] owns two long-lived client handles: a plain one
//! and one whose dialing goes through a [`Resolver`]. Handles are built
//! once and shared; nothing about a single call is stored on them. The
//! deadline, compression flags and handle choice all travel with the call
//! in [`SendOptions`], so concurrent calls with different timeouts cannot
//! interfere with each other.

use std::sync::{Arc, OnceLock};

use reqwest::header::{ACCEPT_ENCODING, CONNECTION, CONTENT_ENCODING};

use crate::resolver::{CachingResolver, DnsCacheResolve, Resolver};
use crate::{SendOptions, Transport, TransportError, gzip};

/// Settings applied when the client handles are built.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Skip TLS certificate verification. On by default: the services this
    /// client talks to are addressed by raw host:port and rarely present a
    /// certificate for that name.
    pub accept_invalid_certs: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
        }
    }
}

/// The HTTP(S) transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    plain: reqwest::Client,
    dns_cached: reqwest::Client,
}

impl HttpTransport {
    /// Builds both handles, with a [`CachingResolver`] behind the
    /// DNS-cache one.
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        Self::with_resolver(config, CachingResolver::default())
    }

    /// Builds both handles, dialing DNS-cache requests through `resolver`.
    pub fn with_resolver<R: Resolver>(
        config: HttpConfig,
        resolver: R,
    ) -> Result<Self, TransportError> {
        let plain = builder(&config)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        let dns_cached = builder(&config)
            .dns_resolver(Arc::new(DnsCacheResolve::new(Arc::new(resolver))))
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        Ok(Self { plain, dns_cached })
    }

    /// The process-wide transport, built on first use with default config.
    pub fn shared() -> Result<Arc<Self>, TransportError> {
        static SHARED: OnceLock<Arc<HttpTransport>> = OnceLock::new();
        if let Some(transport) = SHARED.get() {
            return Ok(Arc::clone(transport));
        }
        let built = Arc::new(Self::new(HttpConfig::default())?);
        Ok(Arc::clone(SHARED.get_or_init(|| built)))
    }
}

/// Common settings for both handles: no proxies, no idle connections.
fn builder(config: &HttpConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .pool_max_idle_per_host(0)
        .no_proxy()
}

impl Transport for HttpTransport {
    type Error = TransportError;

    async fn send(
        &self,
        endpoint: &str,
        payload: Vec<u8>,
        options: &SendOptions,
    ) -> Result<Vec<u8>, Self::Error> {
        let client = if options.dns_cache {
            &self.dns_cached
        } else {
            &self.plain
        };

        let body = if options.request_gzip {
            gzip::compress(&payload)?
        } else {
            payload
        };

        let mut request = client
            .post(endpoint)
            .timeout(options.timeout)
            .header(CONNECTION, "close");
        if options.request_gzip {
            request = request.header(CONTENT_ENCODING, "gzip");
        }
        if options.accept_gzip {
            request = request.header(ACCEPT_ENCODING, "gzip");
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, options.timeout))?;

        let status = response.status();
        let gzipped = response
            .headers()
            .get(CONTENT_ENCODING)
            .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"gzip"));
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(e, options.timeout))?
            .to_vec();

        tracing::debug!(
            endpoint,
            %status,
            gzipped,
            len = bytes.len(),
            "http response received"
        );

        Ok(if gzipped {
            gzip::decompress_or_raw(bytes)
        } else {
            bytes
        })
    }
}
