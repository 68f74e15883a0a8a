//! # Watermarked Detached Signing
//!
//! Payloads are prefixed with their domain watermark, hashed to the 32-byte
//! generic digest and Ed25519-signed. The result carries the raw signature,
//! its `edsig` encoding and the payload‖signature hex used for injection.

use crate::hashing::blake2b_256;
use crate::keys::KeyPair;
use crate::CryptoError;
use shared_codec::base58::{b58check_encode, Prefix};
use shared_codec::{merge, to_hex, Watermark};

/// A detached signature over a watermarked payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedMessage {
    /// Raw 64-byte signature
    pub signature: Vec<u8>,
    /// Signature in `edsig...` form
    pub edsig: String,
    /// Hex of payload ‖ signature, ready for injection
    pub signed_bytes: String,
}

impl KeyPair {
    /// Sign `payload` under `watermark`.
    ///
    /// The digest is BLAKE2b-256 over the watermark byte followed by the
    /// payload; the signature is deterministic.
    pub fn sign(&self, payload: &[u8], watermark: Watermark) -> Result<SignedMessage, CryptoError> {
        let tagged = merge(&[&[watermark.byte()], payload]);
        let digest = blake2b_256(&tagged);
        let signature = self.sign_digest(&digest);

        let edsig = b58check_encode(Prefix::EdSig, &signature)?;
        let signed_bytes = format!("{}{}", to_hex(payload), to_hex(&signature));

        Ok(SignedMessage {
            signature: signature.to_vec(),
            edsig,
            signed_bytes,
        })
    }
}
