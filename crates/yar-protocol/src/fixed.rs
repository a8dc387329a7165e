//! Fixed-width byte fields.
//!
//! The provider, token and packager slots of the header have a fixed wire
//! width. Short values are padded with zero bytes, long values are cut at
//! the byte boundary. Cutting can split a multi-byte UTF-8 sequence; the
//! peer only ever compares raw bytes, so that is acceptable.

/// Copies `value` into an `N`-byte array, zero-padding or truncating.
///
/// ```rust
/// use yar_protocol::pad_or_truncate;
///
/// assert_eq!(pad_or_truncate::<4>("ab"), *b"ab\0\0");
/// assert_eq!(pad_or_truncate::<4>("abcdef"), *b"abcd");
/// ```
pub fn pad_or_truncate<const N: usize>(value: &str) -> [u8; N] {
    let mut out = [0u8; N];
    let bytes = value.as_bytes();
    let n = bytes.len().min(N);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

/// Reads a fixed-width field back as text, dropping the zero padding.
pub fn trim_fixed(field: &[u8]) -> String {
    let end = field
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    String::from_utf8_lossy(&field[..end]).into_owned()
}
