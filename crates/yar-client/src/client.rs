//! Call orchestration.
//!
//! One call runs through these steps, and any failure stops it with a
//! single classified [`YarError`]:
//!
//! ```text
//! scheme check → init_request → pack_request → transport send
//!     → read_response (header, length, envelope, status)
//!     → decode_retval (packager's dynamic value → caller's type)
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use yar_protocol::{
    Codec, Packager, PackagerName, ProtocolHeader, Request, Response, Retval, frame,
};
use yar_transport::{HttpTransport, Scheme, SocketTransport, Transport, TransportError};

use crate::{Options, YarError};

/// Where a call's bytes go.
#[derive(Debug, Clone)]
enum Route {
    Http(Arc<HttpTransport>),
    Socket(SocketTransport),
}

/// A client bound to one address.
///
/// Build it once per endpoint and share it (`&Client` or `Arc<Client>`);
/// concurrent calls are independent.
///
/// ```rust,no_run
/// use yar_client::prelude::*;
///
/// # async fn run() -> Result<(), YarError> {
/// let client = Client::new("http://10.0.0.7:8080/api")?
///     .with_options(Options::new().with_provider("svcA"));
/// let greeting: String = client.call("Echo", params!["hi"]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    address: String,
    scheme: Scheme,
    options: Options,
    route: Route,
}

impl Client {
    /// Creates a client for `address` using the process-wide HTTP transport.
    ///
    /// `tcp://`, `udp://` and `unix://` addresses are accepted here, but
    /// every call on them fails with a Config error.
    ///
    /// # Errors
    /// - Param: the address has no known `scheme://` prefix.
    /// - Config: the shared HTTP transport could not be built.
    pub fn new(address: impl Into<String>) -> Result<Self, YarError> {
        let address = address.into();
        let scheme = parse_scheme(&address)?;
        let route = if scheme.is_http() {
            let transport = HttpTransport::shared()
                .map_err(|e| YarError::Config(e.to_string()))?;
            Route::Http(transport)
        } else {
            Route::Socket(SocketTransport::new(scheme))
        };
        Ok(Self::assemble(address, scheme, route))
    }

    /// Creates a client that sends HTTP calls through `transport`
    /// (for instance one built with a custom [`Resolver`](yar_transport::Resolver)).
    ///
    /// # Errors
    /// Param: the address has no known `scheme://` prefix.
    pub fn with_transport(
        address: impl Into<String>,
        transport: Arc<HttpTransport>,
    ) -> Result<Self, YarError> {
        let address = address.into();
        let scheme = parse_scheme(&address)?;
        let route = if scheme.is_http() {
            Route::Http(transport)
        } else {
            Route::Socket(SocketTransport::new(scheme))
        };
        Ok(Self::assemble(address, scheme, route))
    }

    fn assemble(address: String, scheme: Scheme, route: Route) -> Self {
        Self {
            address,
            scheme,
            options: Options::default(),
            route,
        }
    }

    /// Replaces the call options.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Mutable access for configuring the client before sharing it.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Calls `method` and decodes its return value as `R`.
    ///
    /// # Errors
    /// One of the five [`YarError`] kinds; on error nothing is returned.
    pub async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<R, YarError> {
        let (packager, response, raw) = self.round_trip(method, params).await?;
        decode_retval(packager, &response.retval, &raw)
    }

    /// Calls `method` and ignores whatever it returns.
    ///
    /// A failure status from the peer is still an error.
    pub async fn invoke(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<(), YarError> {
        self.round_trip(method, params).await.map(|_| ())
    }

    async fn round_trip(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<(Packager, Response<Retval>, Vec<u8>), YarError> {
        let transport = match &self.route {
            Route::Http(transport) => transport,
            Route::Socket(socket) => {
                // The stub refuses without dialing; its reason becomes the message.
                let refused = socket
                    .send(&self.address, Vec::new(), &self.options.send_options())
                    .await
                    .err();
                let reason = refused.map_or_else(|| self.scheme.to_string(), |e| e.to_string());
                return Err(YarError::Config(format!(
                    "unsupported non http protocol: {reason}"
                )));
            }
        };

        let (mut header, request) = self.init_request(method, params)?;
        let (packager, frame) = self.pack_request(&mut header, &request)?;

        tracing::debug!(
            method,
            id = request.id,
            packager = packager.name(),
            len = frame.len(),
            address = %self.address,
            "yar call"
        );

        let raw = transport
            .send(&self.address, frame, &self.options.send_options())
            .await?;

        let response = self.read_response(packager, request.id, &raw)?;
        Ok((packager, response, raw))
    }

    /// Builds the header and envelope for a call.
    fn init_request(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<(ProtocolHeader, Request), YarError> {
        if method.is_empty() {
            return Err(YarError::Param("call empty method".into()));
        }

        let request = Request::new(Request::random_id(), method, params);
        let mut header = ProtocolHeader::new(self.options.magic_number, request.id);
        header.set_provider(&self.options.provider);
        header.set_token(&self.options.credential);
        Ok((header, request))
    }

    /// Selects the codec, encodes the envelope and frames it.
    fn pack_request(
        &self,
        header: &mut ProtocolHeader,
        request: &Request,
    ) -> Result<(Packager, Vec<u8>), YarError> {
        let name = PackagerName::from_configured(&self.options.packager);
        let packager = Packager::from_name(&name)
            .map_err(|e| YarError::packager(e.to_string()))?;
        header.set_packager(&name);

        let body = packager
            .encode(request)
            .map_err(|e| YarError::packager(e.to_string()))?;
        let frame = frame::pack(header, &body)
            .map_err(|e| YarError::packager(e.to_string()))?;
        Ok((packager, frame))
    }

    /// Validates the reply frame and decodes the response envelope.
    fn read_response(
        &self,
        packager: Packager,
        request_id: u32,
        raw: &[u8],
    ) -> Result<Response<Retval>, YarError> {
        let (header, body) = frame::split(raw)
            .map_err(|e| YarError::malformed(&format!("response parse error ({e})"), raw))?;
        if header.id != request_id {
            tracing::warn!(
                expected = request_id,
                got = header.id,
                "response correlation id does not match request"
            );
        }

        let response = packager.decode_response(body).map_err(|e| {
            YarError::packager_with_raw(&format!("unpack error: {e}"), raw)
        })?;

        if !response.status.is_ok() {
            let message = response
                .error
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| response.status.to_string());
            tracing::debug!(status = %response.status, %message, "peer reported failure");
            return Err(YarError::Response {
                message,
                raw: Some(raw.to_vec()),
            });
        }

        Ok(response)
    }
}

/// Second decode stage: the dynamic return value becomes the caller's type.
fn decode_retval<R: DeserializeOwned>(
    packager: Packager,
    retval: &Retval,
    raw: &[u8],
) -> Result<R, YarError> {
    packager.transcode(retval).map_err(|e| {
        YarError::packager_with_raw(&format!("decode response retval error: {e}"), raw)
    })
}

fn parse_scheme(address: &str) -> Result<Scheme, YarError> {
    Scheme::of_address(address).map_err(|e| match e {
        TransportError::InvalidAddress(message) => YarError::Param(message),
        other => YarError::Param(other.to_string()),
    })
}
