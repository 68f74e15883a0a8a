//! Hex and buffer helpers for forged payload assembly.

use crate::CodecError;

/// Decode a hex string into bytes.
///
/// # Errors
///
/// Returns `InvalidHex` on odd length or non-hex characters.
pub fn from_hex(input: &str) -> Result<Vec<u8>, CodecError> {
    hex::decode(input).map_err(|e| CodecError::InvalidHex(e.to_string()))
}

/// Encode bytes as lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Concatenate buffers in order into one owned buffer.
pub fn merge(parts: &[&[u8]]) -> Vec<u8> {
    let total = parts.iter().map(|p| p.len()).sum();
    let mut out = Vec::with_capacity(total);
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}
