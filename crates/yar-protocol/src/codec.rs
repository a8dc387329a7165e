//! Codecs ("packagers") for serializing envelopes and values.
//!
//! The header names the codec used for the body in an eight-byte slot.
//! There is no negotiation: both ends simply use the codec named there.
//!
//! [`Codec`] is the strategy interface; [`JsonCodec`] and
//! [`MsgPackCodec`] implement it. Because the trait has generic methods it
//! cannot be used as a trait object, so runtime selection goes through the
//! closed [`Packager`] enum instead of an open registry. Adding a codec
//! means adding a variant, and the compiler points at every `match` that
//! needs updating.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::header::PACKAGER_LEN;
use crate::types::{Response, Retval};
use crate::ProtocolError;

/// A codec that can encode Rust values to bytes and decode bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use yar_protocol::{Codec, JsonCodec, Request};
///
/// let request = Request::new(7, "Echo", vec!["hi".into()]);
/// let bytes = JsonCodec.encode(&request).unwrap();
/// assert_eq!(bytes, br#"{"i":7,"m":"Echo","p":["hi"]}"#);
///
/// let decoded: Request = JsonCodec.decode(&bytes).unwrap();
/// assert_eq!(decoded, request);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(|e| ProtocolError::Encode(e.into()))
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(|e| ProtocolError::Decode(e.into()))
    }
}

// ---------------------------------------------------------------------------
// MsgPackCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses MessagePack (via `rmp-serde`).
///
/// Structs are written as maps with field names (`to_vec_named`), which
/// is what other Yar implementations expect. Positional arrays would
/// decode as garbage on the other side.
#[cfg(feature = "msgpack")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

#[cfg(feature = "msgpack")]
impl Codec for MsgPackCodec {
    fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        rmp_serde::to_vec_named(value).map_err(|e| ProtocolError::Encode(e.into()))
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        rmp_serde::from_slice(data).map_err(|e| ProtocolError::Decode(e.into()))
    }
}

// ---------------------------------------------------------------------------
// PackagerName
// ---------------------------------------------------------------------------

/// The packager key as it appears on the wire: at most eight bytes.
///
/// Names longer than eight bytes are silently cut to their first eight
/// bytes. Two configured names that share a prefix therefore select the
/// same codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackagerName {
    bytes: [u8; PACKAGER_LEN],
    len: usize,
}

impl PackagerName {
    /// Builds the wire key from a configured codec name.
    pub fn from_configured(name: &str) -> Self {
        let len = name.len().min(PACKAGER_LEN);
        Self {
            bytes: crate::pad_or_truncate(name),
            len,
        }
    }

    /// The zero-padded eight-byte field.
    pub fn as_bytes(&self) -> &[u8; PACKAGER_LEN] {
        &self.bytes
    }

    /// The key without padding.
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes[..self.len])
    }
}

impl std::fmt::Display for PackagerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Packager
// ---------------------------------------------------------------------------

/// The closed set of codecs this client can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packager {
    /// `json`
    Json,
    /// `msgpack`
    #[cfg(feature = "msgpack")]
    MsgPack,
}

impl Packager {
    /// Selects the codec named by a wire key (ASCII case-insensitive).
    ///
    /// # Errors
    /// Returns [`ProtocolError::UnknownPackager`] for any other key.
    pub fn from_name(name: &PackagerName) -> Result<Self, ProtocolError> {
        let key = name.as_str();
        if key.eq_ignore_ascii_case("json") {
            return Ok(Self::Json);
        }
        #[cfg(feature = "msgpack")]
        if key.eq_ignore_ascii_case("msgpack") {
            return Ok(Self::MsgPack);
        }
        Err(ProtocolError::UnknownPackager(key.into_owned()))
    }

    /// Canonical name written into the header.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            #[cfg(feature = "msgpack")]
            Self::MsgPack => "msgpack",
        }
    }

    /// Decodes a response body, keeping the return slot in this codec's
    /// own dynamic value.
    ///
    /// JSON bodies yield [`Retval::Json`]. MessagePack bodies yield
    /// [`Retval::MsgPack`], which also holds integer-keyed maps and
    /// binary strings. A missing or nil `r` decodes as null.
    pub fn decode_response(
        &self,
        data: &[u8],
    ) -> Result<Response<Retval>, ProtocolError> {
        match self {
            Self::Json => {
                let response: Response<Value> = JsonCodec.decode(data)?;
                Ok(response.map_retval(Retval::Json))
            }
            #[cfg(feature = "msgpack")]
            Self::MsgPack => {
                let response: Response<Option<rmpv::Value>> = MsgPackCodec.decode(data)?;
                Ok(response
                    .map_retval(|value| Retval::MsgPack(value.unwrap_or(rmpv::Value::Nil))))
            }
        }
    }

    /// Converts a loosely typed value into a concrete type by encoding it
    /// and decoding the bytes again with this codec.
    ///
    /// This is the second half of response decoding: the envelope decode
    /// only recovers a dynamic [`Retval`] for the return slot, while the
    /// caller asks for a specific shape. Going through the codec (rather
    /// than `serde_json::from_value`) keeps that codec's conversion rules.
    pub fn transcode<T: DeserializeOwned>(
        &self,
        value: &(impl Serialize + ?Sized),
    ) -> Result<T, ProtocolError> {
        let bytes = self.encode(value)?;
        self.decode(&bytes)
    }
}

impl Codec for Packager {
    fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Json => JsonCodec.encode(value),
            #[cfg(feature = "msgpack")]
            Self::MsgPack => MsgPackCodec.encode(value),
        }
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        match self {
            Self::Json => JsonCodec.decode(data),
            #[cfg(feature = "msgpack")]
            Self::MsgPack => MsgPackCodec.decode(data),
        }
    }
}
