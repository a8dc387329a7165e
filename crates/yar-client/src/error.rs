//! The client's error taxonomy.
//!
//! Every failed call returns exactly one [`YarError`], and every
//! `YarError` is one of five kinds. Lower-layer errors
//! ([`TransportError`], [`ProtocolError`](yar_protocol::ProtocolError))
//! are folded into these kinds by the client; callers only ever match on
//! the five variants (or on [`ErrorKind`]).

use yar_transport::TransportError;

/// The five categories of call failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid caller input (empty method, malformed address).
    Param,
    /// The client is configured for a transport that does not work.
    Config,
    /// Encoding or decoding failed, at either envelope stage.
    Packager,
    /// Connecting, sending, receiving, timing out or compressing failed.
    Network,
    /// The reply was malformed or the peer reported a failure.
    Response,
}

/// A failed call.
#[derive(Debug, thiserror::Error)]
pub enum YarError {
    #[error("param error: {0}")]
    Param(String),

    #[error("config error: {0}")]
    Config(String),

    /// `raw` holds the peer's reply when the failure happened while
    /// decoding it.
    #[error("packager error: {message}")]
    Packager {
        message: String,
        raw: Option<Vec<u8>>,
    },

    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// `raw` holds the peer's reply as received.
    #[error("response error: {message}")]
    Response {
        message: String,
        raw: Option<Vec<u8>>,
    },
}

impl YarError {
    /// Which of the five kinds this is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Param(_) => ErrorKind::Param,
            Self::Config(_) => ErrorKind::Config,
            Self::Packager { .. } => ErrorKind::Packager,
            Self::Network(_) => ErrorKind::Network,
            Self::Response { .. } => ErrorKind::Response,
        }
    }

    /// The raw reply bytes kept for diagnosis, if any.
    pub fn raw_response(&self) -> Option<&[u8]> {
        match self {
            Self::Packager { raw, .. } | Self::Response { raw, .. } => {
                raw.as_deref()
            }
            _ => None,
        }
    }

    /// A packager failure with no reply involved (request side).
    pub(crate) fn packager(message: impl Into<String>) -> Self {
        Self::Packager {
            message: message.into(),
            raw: None,
        }
    }

    /// A packager failure while decoding `raw`; the reply is echoed into
    /// the message.
    pub(crate) fn packager_with_raw(context: &str, raw: &[u8]) -> Self {
        Self::Packager {
            message: format!("{context} {}", String::from_utf8_lossy(raw)),
            raw: Some(raw.to_vec()),
        }
    }

    /// A malformed reply; the reply is echoed into the message.
    pub(crate) fn malformed(context: &str, raw: &[u8]) -> Self {
        Self::Response {
            message: format!("{context}: {}", String::from_utf8_lossy(raw)),
            raw: Some(raw.to_vec()),
        }
    }
}
