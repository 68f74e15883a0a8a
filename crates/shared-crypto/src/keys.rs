//! # Delegate Key Material
//!
//! Ed25519 keypairs derived from a mnemonic, a raw seed, an `edsk` secret or
//! an `edesk` ciphertext. The base58 forms are computed once at construction;
//! the signing key stays in memory for the session and is zeroized on drop.

use crate::encryption::decrypt_secret_key;
use crate::hashing::blake2b_160;
use crate::CryptoError;
use bip39::{Language, Mnemonic};
use ed25519_dalek::{Signer, SigningKey};
use shared_codec::base58::{b58check_decode, b58check_encode, Prefix};
use zeroize::Zeroize;

/// An Ed25519 delegate keypair with its base58 encodings.
pub struct KeyPair {
    signing_key: SigningKey,
    /// Secret key, `edsk...` (64-byte form)
    pub secret_key: String,
    /// Public key, `edpk...`
    pub public_key: String,
    /// Public key hash, `tz1...`
    pub public_key_hash: String,
}

impl KeyPair {
    /// Derive from a validated BIP39 mnemonic and passphrase.
    ///
    /// # Errors
    ///
    /// `InvalidMnemonic` when the phrase fails word-list or checksum
    /// validation; no derivation is attempted on invalid input.
    pub fn from_mnemonic(mnemonic: &str, passphrase: &str) -> Result<Self, CryptoError> {
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, mnemonic)
            .map_err(|_| CryptoError::InvalidMnemonic)?;

        let mut full_seed = mnemonic.to_seed_normalized(passphrase);
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&full_seed[..32]);
        full_seed.zeroize();

        let pair = Self::from_seed(&seed);
        seed.zeroize();
        pair
    }

    /// Build from a raw 32-byte Ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key = SigningKey::from_bytes(seed);
        Self::from_signing_key(signing_key)
    }

    /// Build from an `edsk...` secret key string.
    ///
    /// Accepts both the 64-byte expanded form and the 32-byte seed form.
    ///
    /// # Errors
    ///
    /// `InvalidSecretKey` when the string decodes under neither prefix.
    pub fn from_secret_key(secret_key: &str) -> Result<Self, CryptoError> {
        let mut seed = [0u8; 32];
        match b58check_decode(Prefix::EdSk, secret_key) {
            Ok(mut expanded) => {
                // first half of the expanded secret is the seed
                seed.copy_from_slice(&expanded[..32]);
                expanded.zeroize();
            }
            Err(_) => {
                let mut raw = b58check_decode(Prefix::EdSeed, secret_key).map_err(|_| {
                    CryptoError::InvalidSecretKey("not an edsk secret or seed".into())
                })?;
                seed.copy_from_slice(&raw);
                raw.zeroize();
            }
        }
        let pair = Self::from_seed(&seed);
        seed.zeroize();
        pair
    }

    /// Decrypt an `edesk...` ciphertext with `passphrase` and build the pair.
    ///
    /// # Errors
    ///
    /// `DecryptionFailed` on a wrong passphrase, `InvalidSecretKey` on a
    /// malformed ciphertext.
    pub fn from_encrypted(encrypted: &str, passphrase: &str) -> Result<Self, CryptoError> {
        let mut seed = decrypt_secret_key(encrypted, passphrase)?;
        let pair = Self::from_seed(&seed);
        seed.zeroize();
        pair
    }

    fn from_signing_key(signing_key: SigningKey) -> Result<Self, CryptoError> {
        let verifying_key = signing_key.verifying_key();
        let pk_bytes = verifying_key.to_bytes();

        // 64-byte expanded secret: seed ‖ public key
        let mut expanded = [0u8; 64];
        expanded[..32].copy_from_slice(&signing_key.to_bytes());
        expanded[32..].copy_from_slice(&pk_bytes);

        let secret_key = b58check_encode(Prefix::EdSk, &expanded)?;
        let public_key = b58check_encode(Prefix::EdPk, &pk_bytes)?;
        let public_key_hash = b58check_encode(Prefix::Tz1, &blake2b_160(&pk_bytes))?;
        expanded.zeroize();

        Ok(Self {
            signing_key,
            secret_key,
            public_key,
            public_key_hash,
        })
    }

    /// Raw public key bytes.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Detached Ed25519 signature over `digest`.
    pub(crate) fn sign_digest(&self, digest: &[u8]) -> [u8; 64] {
        self.signing_key.sign(digest).to_bytes()
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self {
            signing_key: self.signing_key.clone(),
            secret_key: self.secret_key.clone(),
            public_key: self.public_key.clone(),
            public_key_hash: self.public_key_hash.clone(),
        }
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
        self.secret_key.zeroize();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key_hash", &self.public_key_hash)
            .finish_non_exhaustive()
    }
}
