//! The fixed-width protocol header that prefixes every frame.
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐
//! │ magic    │ id       │ provider │ token    │ packager │ body len │
//! │ 4 bytes  │ 4 bytes  │ 28 bytes │ 32 bytes │ 8 bytes  │ 4 bytes  │
//! │ u32 BE   │ u32 BE   │ padded   │ padded   │ truncated│ u32 BE   │
//! └──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Field order and widths must match the peer byte for byte. The body
//! length counts the packager slot plus the encoded body, so the bytes
//! that follow the header number `body_length - PACKAGER_LEN`.

use crate::fixed::{pad_or_truncate, trim_fixed};
use crate::PackagerName;

/// Protocol tag both ends must agree on.
pub const MAGIC_NUMBER: u32 = 0x80DF_EC60;

/// Wire width of the provider (identity) field.
pub const PROVIDER_LEN: usize = 28;

/// Wire width of the token (credential) field.
pub const TOKEN_LEN: usize = 32;

/// Wire width of the packager name field.
pub const PACKAGER_LEN: usize = 8;

/// Total header size in bytes.
pub const HEADER_LEN: usize = 4 + 4 + PROVIDER_LEN + TOKEN_LEN + PACKAGER_LEN + 4;

const _: () = assert!(HEADER_LEN == 80);

// Byte offsets of each field.
const ID_AT: usize = 4;
const PROVIDER_AT: usize = 8;
const TOKEN_AT: usize = PROVIDER_AT + PROVIDER_LEN;
const PACKAGER_AT: usize = TOKEN_AT + TOKEN_LEN;
const BODY_LEN_AT: usize = PACKAGER_AT + PACKAGER_LEN;

/// Decoded protocol header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolHeader {
    /// Protocol tag, compared against the peer's.
    pub magic_number: u32,
    /// Correlation id pairing a response with its request.
    pub id: u32,
    /// Caller identity, zero-padded.
    pub provider: [u8; PROVIDER_LEN],
    /// Service credential, zero-padded.
    pub token: [u8; TOKEN_LEN],
    /// Codec key, truncated to eight bytes.
    pub packager: [u8; PACKAGER_LEN],
    /// `PACKAGER_LEN` + length of the encoded body.
    pub body_length: u32,
}

impl ProtocolHeader {
    /// Creates a header with empty identity fields and no body.
    pub fn new(magic_number: u32, id: u32) -> Self {
        Self {
            magic_number,
            id,
            provider: [0; PROVIDER_LEN],
            token: [0; TOKEN_LEN],
            packager: [0; PACKAGER_LEN],
            body_length: 0,
        }
    }

    /// Writes the provider identity, padding or truncating to 28 bytes.
    pub fn set_provider(&mut self, provider: &str) {
        self.provider = pad_or_truncate(provider);
    }

    /// Writes the service credential, padding or truncating to 32 bytes.
    pub fn set_token(&mut self, token: &str) {
        self.token = pad_or_truncate(token);
    }

    /// Writes the packager key.
    pub fn set_packager(&mut self, name: &PackagerName) {
        self.packager = *name.as_bytes();
    }

    /// Sets `body_length` from the size of the encoded body.
    ///
    /// Returns `None` if the body is too large to describe in 32 bits.
    pub fn set_body_len(&mut self, encoded_len: usize) -> Option<()> {
        let total = encoded_len.checked_add(PACKAGER_LEN)?;
        self.body_length = u32::try_from(total).ok()?;
        Some(())
    }

    /// Number of body bytes expected after the header, or `None` when the
    /// declared length cannot even cover the packager slot.
    pub fn payload_len(&self) -> Option<usize> {
        (self.body_length as usize).checked_sub(PACKAGER_LEN)
    }

    /// Provider field as text.
    pub fn provider_str(&self) -> String {
        trim_fixed(&self.provider)
    }

    /// Token field as text.
    pub fn token_str(&self) -> String {
        trim_fixed(&self.token)
    }

    /// Packager field as text.
    pub fn packager_str(&self) -> String {
        trim_fixed(&self.packager)
    }

    /// Encodes the header to bytes (big endian).
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..ID_AT].copy_from_slice(&self.magic_number.to_be_bytes());
        buf[ID_AT..PROVIDER_AT].copy_from_slice(&self.id.to_be_bytes());
        buf[PROVIDER_AT..TOKEN_AT].copy_from_slice(&self.provider);
        buf[TOKEN_AT..PACKAGER_AT].copy_from_slice(&self.token);
        buf[PACKAGER_AT..BODY_LEN_AT].copy_from_slice(&self.packager);
        buf[BODY_LEN_AT..HEADER_LEN].copy_from_slice(&self.body_length.to_be_bytes());
        buf
    }

    /// Decodes a header from the front of `buf`.
    ///
    /// Returns `None` if `buf` is shorter than [`HEADER_LEN`].
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let buf: &[u8; HEADER_LEN] = buf.get(..HEADER_LEN)?.try_into().ok()?;
        Some(Self {
            magic_number: read_u32(buf, 0),
            id: read_u32(buf, ID_AT),
            provider: copy_field(buf, PROVIDER_AT),
            token: copy_field(buf, TOKEN_AT),
            packager: copy_field(buf, PACKAGER_AT),
            body_length: read_u32(buf, BODY_LEN_AT),
        })
    }
}

fn read_u32(buf: &[u8; HEADER_LEN], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn copy_field<const N: usize>(buf: &[u8; HEADER_LEN], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[at..at + N]);
    out
}
