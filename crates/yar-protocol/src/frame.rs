//! Framing: header + encoded body.
//!
//! Sending side: encode the body, record its length in the header, then
//! lay the header bytes in front of it. Receiving side: check there is a
//! whole header, check the declared body actually arrived, and hand back
//! exactly the declared body bytes.

use crate::{HEADER_LEN, ProtocolError, ProtocolHeader};

/// Sets `header.body_length` for `body` and returns header bytes + body.
///
/// # Errors
/// Returns [`ProtocolError::InvalidMessage`] if the body is too large to
/// describe in the 32-bit length field.
pub fn pack(
    header: &mut ProtocolHeader,
    body: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    header.set_body_len(body.len()).ok_or_else(|| {
        ProtocolError::InvalidMessage(format!(
            "body of {} bytes exceeds the length field",
            body.len()
        ))
    })?;

    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&header.encode());
    frame.extend_from_slice(body);
    Ok(frame)
}

/// Splits a received frame into its header and body.
///
/// Trailing bytes beyond the declared body length are ignored.
///
/// # Errors
/// - [`ProtocolError::TooShort`] if fewer than [`HEADER_LEN`] bytes arrived.
/// - [`ProtocolError::InvalidMessage`] if the declared length cannot cover
///   the packager slot.
/// - [`ProtocolError::Truncated`] if fewer body bytes arrived than declared.
pub fn split(raw: &[u8]) -> Result<(ProtocolHeader, &[u8]), ProtocolError> {
    let header = ProtocolHeader::decode(raw).ok_or(ProtocolError::TooShort {
        len: raw.len(),
        needed: HEADER_LEN,
    })?;

    let declared = header.payload_len().ok_or_else(|| {
        ProtocolError::InvalidMessage(format!(
            "body length {} is smaller than the packager field",
            header.body_length
        ))
    })?;

    let rest = &raw[HEADER_LEN..];
    if rest.len() < declared {
        return Err(ProtocolError::Truncated {
            declared,
            available: rest.len(),
        });
    }

    Ok((header, &rest[..declared]))
}
