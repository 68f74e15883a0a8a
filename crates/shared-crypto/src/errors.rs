//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Mnemonic failed BIP39 validation (word list, count or checksum)
    #[error("Invalid mnemonic")]
    InvalidMnemonic,

    /// Secret key string is not a usable edsk/edesk
    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    /// Public key bytes are not a valid curve point
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Authentication failed during decryption (wrong passphrase or
    /// tampered ciphertext)
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Key derivation failed
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    /// Underlying codec failure (base58, hex)
    #[error(transparent)]
    Codec(#[from] shared_codec::CodecError),
}
