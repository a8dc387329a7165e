//! Raw socket transport (tcp, udp, unix).
//!
//! Addresses with these schemes are accepted so that configuration can
//! name them ahead of time, but no socket framing is implemented. Every
//! send fails straight away with [`TransportError::Unsupported`]; nothing
//! is dialed.

use crate::{Scheme, SendOptions, Transport, TransportError};

/// Placeholder transport for non-HTTP schemes.
#[derive(Debug, Clone)]
pub struct SocketTransport {
    scheme: Scheme,
}

impl SocketTransport {
    /// Creates the stub for `scheme`.
    pub fn new(scheme: Scheme) -> Self {
        Self { scheme }
    }

    /// The scheme this stub stands in for.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }
}

impl Transport for SocketTransport {
    type Error = TransportError;

    async fn send(
        &self,
        endpoint: &str,
        _payload: Vec<u8>,
        _options: &SendOptions,
    ) -> Result<Vec<u8>, Self::Error> {
        tracing::debug!(endpoint, scheme = %self.scheme, "socket transport not implemented");
        Err(TransportError::Unsupported(self.scheme))
    }
}
