//! # Zarith Naturals
//!
//! Variable-length encoding of non-negative integers: little-endian 7-bit
//! groups, high bit set on every byte except the last. Must match the node's
//! forge output exactly: the forge-verification step compares whole payloads
//! byte for byte.

use crate::CodecError;

/// Encode a non-negative integer as a zarith natural.
pub fn encode_nat(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    loop {
        let group = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(group);
            return out;
        }
        out.push(group | 0x80);
    }
}

/// Decode a zarith natural from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
///
/// `TruncatedZarith` when the continuation bit runs off the end of the input,
/// `ZarithOverflow` when the value exceeds `u64`.
pub fn decode_nat(bytes: &[u8]) -> Result<(u64, usize), CodecError> {
    let mut value: u64 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        let group = (byte & 0x7f) as u64;
        if i * 7 >= 64 || (i * 7 > 0 && group >> (64 - i * 7) != 0) {
            return Err(CodecError::ZarithOverflow);
        }
        value |= group << (i * 7);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(CodecError::TruncatedZarith)
}
