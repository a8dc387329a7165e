//! Wire protocol for Yar.
//!
//! This crate defines what travels between a Yar client and its peer:
//!
//! - **Header** ([`ProtocolHeader`]): the fixed 80-byte prefix carrying the
//!   protocol tag, correlation id, identity, codec key and body length.
//! - **Envelopes** ([`Request`], [`Response`], [`Status`]): the bodies
//!   that follow the header.
//! - **Packagers** ([`Codec`], [`Packager`]): how envelopes become bytes.
//! - **Framing** ([`frame`]): header + body assembly and validation.
//!
//! # Architecture
//!
//! The protocol layer sits between the client (method calls) and the
//! transport (opaque bytes). It knows nothing about HTTP or sockets.
//!
//! ```text
//! Client (method, params) → Protocol (header + body) → Transport (bytes)
//! ```

mod codec;
mod error;
mod fixed;
pub mod frame;
mod header;
mod types;

pub use codec::{Codec, JsonCodec, Packager, PackagerName};
#[cfg(feature = "msgpack")]
pub use codec::MsgPackCodec;
pub use error::{BoxError, ProtocolError};
pub use fixed::{pad_or_truncate, trim_fixed};
pub use header::{
    HEADER_LEN, MAGIC_NUMBER, PACKAGER_LEN, PROVIDER_LEN, ProtocolHeader,
    TOKEN_LEN,
};
pub use types::{Request, Response, Retval, Status};

#[cfg(feature = "msgpack")]
pub use rmpv;
