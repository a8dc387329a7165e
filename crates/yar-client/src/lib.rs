//! # yar-client
//!
//! An async client for the Yar binary RPC protocol.
//!
//! A call sends a method name and an ordered list of parameters to a peer
//! and gets back either a typed return value or one [`YarError`]:
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use yar_client::prelude::*;
//!
//! # async fn run() -> Result<(), YarError> {
//! let client = Client::new("http://10.0.0.7:8080/api")?.with_options(
//!     Options::new()
//!         .with_provider("svcA")
//!         .with_credential("tokenX")
//!         .with_timeout(Duration::from_millis(2000)),
//! );
//!
//! let greeting: String = client.call("Echo", params!["hi"]).await?;
//! client.invoke("Touch", params![]).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | `yar-protocol` | Header, envelopes, packagers, framing |
//! | `yar-transport` | HTTP transport, gzip, DNS-cache dialing |
//! | `yar-discovery` | Host list publication for service discovery |

mod client;
mod error;
mod options;

pub use client::Client;
pub use error::{ErrorKind, YarError};
pub use options::{DEFAULT_PACKAGER, DEFAULT_TIMEOUT_MS, Options};

pub use serde_json::Value;
pub use yar_protocol::{Retval, Status, MAGIC_NUMBER};
pub use yar_transport::{
    CachingResolver, HttpConfig, HttpTransport, Resolver, Scheme,
    TransportError,
};

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Builds a call's parameter list from any serializable expressions.
///
/// ```rust
/// use yar_client::params;
///
/// let params = params![1, "two", [3, 4]];
/// assert_eq!(params.len(), 3);
/// assert!(params![].is_empty());
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($param:expr),+ $(,)?) => {
        ::std::vec![$($crate::__serde_json::json!($param)),+]
    };
}

/// Everything needed to make calls.
pub mod prelude {
    pub use crate::params;
    pub use crate::{Client, ErrorKind, Options, Value, YarError};
}
