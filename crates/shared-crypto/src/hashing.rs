//! # BLAKE2b Hashing
//!
//! The protocol's generic hash is 32-byte BLAKE2b; key hashes are 20-byte
//! BLAKE2b over the public key bytes.

use blake2::digest::consts::{U20, U32};
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;
type Blake2b160 = Blake2b<U20>;

/// 32-byte generic hash.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// 20-byte hash used for public key hashes.
pub fn blake2b_160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Blake2b160::new();
    hasher.update(data);
    hasher.finalize().into()
}
