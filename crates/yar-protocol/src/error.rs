//! Error types for the protocol layer.
//!
//! Everything that can go wrong while turning envelopes into bytes (or
//! bytes back into envelopes) ends up here. The client crate decides which
//! public error kind each variant maps to.

/// Boxed error coming out of a codec backend (serde_json, rmp-serde).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] BoxError),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: malformed input, missing required fields,
    /// wrong data types, or a body written by a different packager.
    #[error("decode failed: {0}")]
    Decode(#[source] BoxError),

    /// The packager key in the options does not name a known codec.
    #[error("unsupported packager: {0:?}")]
    UnknownPackager(String),

    /// Fewer bytes than a full protocol header were received.
    #[error("frame too short: {len} bytes, header needs {needed}")]
    TooShort { len: usize, needed: usize },

    /// The header claims more body bytes than were actually received.
    #[error("frame truncated: header declares {declared} body bytes, {available} present")]
    Truncated { declared: usize, available: usize },

    /// The frame is structurally invalid in some other way.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
