//! # Secret-Key Encryption
//!
//! `edesk` ciphertexts: an 8-byte random salt followed by the 32-byte seed
//! sealed under XChaCha20-Poly1305. The symmetric key is derived with
//! PBKDF2-HMAC-SHA512 over the passphrase and salt.
//!
//! ## Security Properties
//!
//! - The sealing key is single-use (fresh salt per encryption), so the fixed
//!   all-zero nonce is sound
//! - Poly1305 authentication makes a wrong passphrase an error, never a
//!   plausible-looking wrong key

use crate::CryptoError;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use hmac::Hmac;
use sha2::Sha512;
use shared_codec::base58::{b58check_decode, b58check_encode, Prefix};
use zeroize::Zeroize;

/// PBKDF2 iteration count fixed by the ciphertext format.
const KDF_ITERATIONS: u32 = 32768;
/// Salt length prepended to the sealed box.
const SALT_LEN: usize = 8;
/// Seed length inside the box.
const SEED_LEN: usize = 32;

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<[u8; 32], CryptoError> {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2::<Hmac<Sha512>>(passphrase.as_bytes(), salt, KDF_ITERATIONS, &mut key)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    Ok(key)
}

/// Seal a 32-byte seed under `passphrase`, returning an `edesk...` string.
///
/// # Errors
///
/// `EncryptionFailed` when sealing fails.
pub fn encrypt_secret_key(seed: &[u8; 32], passphrase: &str) -> Result<String, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut salt);

    let mut key = derive_key(passphrase, &salt)?;
    let cipher = XChaCha20Poly1305::new((&key).into());
    let sealed = cipher
        .encrypt(XNonce::from_slice(&[0u8; 24]), seed.as_slice())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    key.zeroize();

    let mut payload = Vec::with_capacity(SALT_LEN + sealed.len());
    payload.extend_from_slice(&salt);
    payload.extend_from_slice(&sealed);

    Ok(b58check_encode(Prefix::EdEsk, &payload)?)
}

/// Open an `edesk...` ciphertext with `passphrase`, returning the seed.
///
/// # Errors
///
/// `DecryptionFailed` when authentication fails (wrong passphrase or
/// tampered ciphertext); codec errors when the string is not a valid
/// `edesk` payload.
pub fn decrypt_secret_key(encrypted: &str, passphrase: &str) -> Result<[u8; 32], CryptoError> {
    let payload = b58check_decode(Prefix::EdEsk, encrypted)?;
    let (salt, sealed) = payload.split_at(SALT_LEN);

    let mut key = derive_key(passphrase, salt)?;
    let cipher = XChaCha20Poly1305::new((&key).into());
    let mut opened = cipher
        .decrypt(XNonce::from_slice(&[0u8; 24]), sealed)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    key.zeroize();

    if opened.len() != SEED_LEN {
        opened.zeroize();
        return Err(CryptoError::DecryptionFailed);
    }

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&opened);
    opened.zeroize();
    Ok(seed)
}
