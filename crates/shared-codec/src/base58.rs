//! # Base58Check
//!
//! Tezos-flavoured Base58Check: a fixed prefix identifies the payload class
//! and its exact byte length, a 4-byte double-SHA256 checksum guards against
//! transcription errors.

use crate::CodecError;
use sha2::{Digest, Sha256};

/// Payload classes with their on-the-wire prefix bytes and fixed lengths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prefix {
    /// Ed25519 public key hash (`tz1...`), 20 bytes
    Tz1,
    /// Secp256k1 public key hash (`tz2...`), 20 bytes
    Tz2,
    /// P-256 public key hash (`tz3...`), 20 bytes
    Tz3,
    /// Originated contract hash (`KT1...`), 20 bytes
    Kt1,
    /// Ed25519 public key (`edpk...`), 32 bytes
    EdPk,
    /// Ed25519 secret key (`edsk...`, 64 bytes: seed ‖ public)
    EdSk,
    /// Ed25519 seed (`edsk...` short form, 32 bytes)
    EdSeed,
    /// Encrypted Ed25519 seed (`edesk...`, 8-byte salt ‖ 48-byte box)
    EdEsk,
    /// Ed25519 signature (`edsig...`), 64 bytes
    EdSig,
    /// Generic signature (`sig...`), 64 bytes
    Sig,
    /// Block hash (`B...`), 32 bytes
    Block,
    /// Operation hash (`o...`), 32 bytes
    Operation,
    /// Protocol hash (`P...`), 32 bytes
    Protocol,
    /// Chain id (`Net...`), 4 bytes
    ChainId,
    /// Seed nonce hash (`nce...`), 32 bytes
    Nce,
}

impl Prefix {
    /// Raw prefix bytes prepended to the payload before encoding.
    pub fn bytes(self) -> &'static [u8] {
        match self {
            Prefix::Tz1 => &[6, 161, 159],
            Prefix::Tz2 => &[6, 161, 161],
            Prefix::Tz3 => &[6, 161, 164],
            Prefix::Kt1 => &[2, 90, 121],
            Prefix::EdPk => &[13, 15, 37, 217],
            Prefix::EdSk => &[43, 246, 78, 7],
            Prefix::EdSeed => &[13, 15, 58, 7],
            Prefix::EdEsk => &[7, 90, 60, 179, 41],
            Prefix::EdSig => &[9, 245, 205, 134, 18],
            Prefix::Sig => &[4, 130, 43],
            Prefix::Block => &[1, 52],
            Prefix::Operation => &[5, 116],
            Prefix::Protocol => &[2, 170],
            Prefix::ChainId => &[87, 82, 0],
            Prefix::Nce => &[69, 220, 169],
        }
    }

    /// Exact payload length in bytes for this class.
    pub fn payload_len(self) -> usize {
        match self {
            Prefix::Tz1 | Prefix::Tz2 | Prefix::Tz3 | Prefix::Kt1 => 20,
            Prefix::EdPk | Prefix::EdSeed => 32,
            Prefix::EdSk | Prefix::EdSig | Prefix::Sig => 64,
            Prefix::EdEsk => 56,
            Prefix::Block | Prefix::Operation | Prefix::Protocol | Prefix::Nce => 32,
            Prefix::ChainId => 4,
        }
    }

    /// Human-readable prefix string (for error messages).
    pub fn name(self) -> &'static str {
        match self {
            Prefix::Tz1 => "tz1",
            Prefix::Tz2 => "tz2",
            Prefix::Tz3 => "tz3",
            Prefix::Kt1 => "KT1",
            Prefix::EdPk => "edpk",
            Prefix::EdSk => "edsk",
            Prefix::EdSeed => "edsk(seed)",
            Prefix::EdEsk => "edesk",
            Prefix::EdSig => "edsig",
            Prefix::Sig => "sig",
            Prefix::Block => "B",
            Prefix::Operation => "o",
            Prefix::Protocol => "P",
            Prefix::ChainId => "Net",
            Prefix::Nce => "nce",
        }
    }
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}

/// Encode `payload` under `prefix` with a 4-byte checksum.
///
/// # Errors
///
/// Returns `InvalidPrefixLength` when `payload` is not the class's fixed
/// length.
pub fn b58check_encode(prefix: Prefix, payload: &[u8]) -> Result<String, CodecError> {
    if payload.len() != prefix.payload_len() {
        return Err(CodecError::InvalidPrefixLength {
            expected: prefix.payload_len(),
            actual: payload.len(),
        });
    }

    let mut data = Vec::with_capacity(prefix.bytes().len() + payload.len() + 4);
    data.extend_from_slice(prefix.bytes());
    data.extend_from_slice(payload);
    let checksum = double_sha256(&data);
    data.extend_from_slice(&checksum[..4]);

    Ok(bs58::encode(data).into_string())
}

/// Decode a Base58Check string, verifying checksum, prefix and length.
///
/// Returns the bare payload with prefix and checksum stripped.
///
/// # Errors
///
/// `InvalidBase58` on alphabet violations, `InvalidChecksum` on checksum
/// mismatch, `WrongPrefix` when the payload carries another class's prefix
/// and `InvalidPrefixLength` when the remainder has the wrong size.
pub fn b58check_decode(prefix: Prefix, encoded: &str) -> Result<Vec<u8>, CodecError> {
    let raw = bs58::decode(encoded)
        .into_vec()
        .map_err(|_| CodecError::InvalidBase58)?;

    if raw.len() < 4 {
        return Err(CodecError::InvalidChecksum);
    }
    let (body, checksum) = raw.split_at(raw.len() - 4);
    if double_sha256(body)[..4] != *checksum {
        return Err(CodecError::InvalidChecksum);
    }

    let prefix_bytes = prefix.bytes();
    if body.len() < prefix_bytes.len() || &body[..prefix_bytes.len()] != prefix_bytes {
        return Err(CodecError::WrongPrefix {
            expected: prefix.name(),
        });
    }

    let payload = &body[prefix_bytes.len()..];
    if payload.len() != prefix.payload_len() {
        return Err(CodecError::InvalidPrefixLength {
            expected: prefix.payload_len(),
            actual: payload.len(),
        });
    }

    Ok(payload.to_vec())
}
