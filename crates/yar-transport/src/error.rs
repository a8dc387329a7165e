use std::time::Duration;

use crate::Scheme;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The address has no recognisable `scheme://` prefix.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// No transport is implemented for this scheme.
    #[error("unsupported transport: {0}")]
    Unsupported(Scheme),

    /// The HTTP client handle could not be built.
    #[error("client setup failed: {0}")]
    Setup(String),

    /// Name resolution failed or returned no addresses.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// The connection could not be established.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The request did not complete within its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Any other failure while sending or receiving.
    #[error("request failed: {0}")]
    Request(String),

    /// Compressing the outgoing body failed.
    #[error("compression failed: {0}")]
    Compression(#[source] std::io::Error),
}

impl TransportError {
    /// Classifies a `reqwest` failure, keeping the whole cause chain in the
    /// message (resolver errors are buried a few levels down).
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return Self::Timeout(timeout);
        }
        let message = chain(&err);
        if err.is_connect() {
            Self::Connect(message)
        } else {
            Self::Request(message)
        }
    }
}

fn chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
