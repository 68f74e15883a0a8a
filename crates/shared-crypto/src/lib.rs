//! # Shared Crypto - Baker Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | BLAKE2b-256 / BLAKE2b-160 | Signing digests, key hashes |
//! | `keys` | Ed25519 | Delegate identity and signing |
//! | `encryption` | PBKDF2-HMAC-SHA512 + XChaCha20-Poly1305 | Sealed secret keys |
//! | `signing` | Watermarked detached signatures | Blocks, endorsements, operations |
//!
//! ## Security Properties
//!
//! - Ed25519 signatures are deterministic; no RNG in the signing path
//! - Decryption authenticates: a wrong passphrase fails, never returns a
//!   plausible wrong key
//! - Derived seeds are zeroized before buffers are dropped

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encryption;
pub mod errors;
pub mod hashing;
pub mod keys;
pub mod signing;

pub use encryption::{decrypt_secret_key, encrypt_secret_key};
pub use errors::CryptoError;
pub use hashing::{blake2b_160, blake2b_256};
pub use keys::KeyPair;
pub use signing::SignedMessage;
