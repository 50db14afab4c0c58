//! # Image Payload Decoding
//!
//! Upload payloads arrive as base64 text, optionally wrapped in a data-URI
//! header (`data:image/jpeg;base64,<payload>`). Everything up to and
//! including the first comma is discarded; the remainder is standard,
//! padded base64. ASCII whitespace (line-wrapped encoders) is ignored.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::DecodeError;

/// Drop a data-URI header, if any.
///
/// Only the first comma matters; the base64 alphabet never contains one.
pub fn strip_data_uri(raw: &str) -> &str {
    match raw.split_once(',') {
        Some((_, payload)) => payload,
        None => raw,
    }
}

/// Decode an upload payload into raw image bytes.
pub fn decode_image(raw: &str) -> Result<Vec<u8>, DecodeError> {
    let payload = strip_data_uri(raw);
    let bytes = if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD.decode(compact)?
    } else {
        STANDARD.decode(payload)?
    };
    Ok(bytes)
}
