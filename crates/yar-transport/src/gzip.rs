//! Gzip helpers for request and response bodies.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::TransportError;

/// Gzip-compresses a whole body.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, TransportError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(TransportError::Compression)?;
    encoder.finish().map_err(TransportError::Compression)
}

/// Inflates a body the peer labelled as gzip.
///
/// If it does not inflate, the raw bytes are returned unchanged and no
/// error is raised: some peers set the header on plain bodies.
pub fn decompress_or_raw(data: Vec<u8>) -> Vec<u8> {
    let mut inflated = Vec::new();
    match GzDecoder::new(data.as_slice()).read_to_end(&mut inflated) {
        Ok(_) => inflated,
        Err(e) => {
            tracing::warn!(
                error = %e,
                len = data.len(),
                "response labelled gzip did not inflate, using raw body"
            );
            data
        }
    }
}
