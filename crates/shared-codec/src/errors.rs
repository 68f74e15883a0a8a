//! Codec error types.

use thiserror::Error;

/// Errors from Base58Check, zarith or hex conversions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Input is not valid base58
    #[error("Invalid base58 input")]
    InvalidBase58,

    /// Double-SHA256 checksum did not match
    #[error("Invalid checksum")]
    InvalidChecksum,

    /// Decoded payload does not carry the expected prefix bytes
    #[error("Wrong prefix: expected {expected}")]
    WrongPrefix {
        /// Human-readable prefix name (tz1, edpk, ...)
        expected: &'static str,
    },

    /// Payload length does not match the prefix's fixed length
    #[error("Invalid prefix length: expected {expected} bytes, got {actual}")]
    InvalidPrefixLength {
        /// Required payload length for this prefix
        expected: usize,
        /// Actual payload length
        actual: usize,
    },

    /// Input is not valid hex
    #[error("Invalid hex input: {0}")]
    InvalidHex(String),

    /// Zarith input ended before the final group
    #[error("Truncated zarith value")]
    TruncatedZarith,

    /// Zarith value does not fit the target integer
    #[error("Zarith value overflows u64")]
    ZarithOverflow,
}
