//! # Proof-of-Work Header Miner
//!
//! Brute-force search over the 4-byte pow counter of a forged block header
//! until the header's generic hash clears the network threshold. CPU-bound
//! and unbounded by design (difficulty is network-defined), so the loop
//! yields back to the runtime every fixed batch of attempts instead of
//! starving the scheduler's ticks and network I/O.

use crate::ForgeError;
use shared_codec::from_hex;
use shared_crypto::blake2b_256;
use tracing::debug;

/// Attempts between cooperative yields.
const YIELD_BATCH: u64 = 2_000;

/// Fixed 4-byte pow-header field preceding the counter.
const POW_HEADER: [u8; 4] = [0x00, 0x00, 0x00, 0x03];

/// Signature placeholder appended while hashing.
const SIGNATURE_PLACEHOLDER: [u8; 64] = [0u8; 64];

/// A successfully mined header.
#[derive(Clone, Debug)]
pub struct MinedHeader {
    /// Header bytes without the signature placeholder, ready for signing
    pub bytes: Vec<u8>,
    /// Attempts spent finding the nonce
    pub attempts: u64,
}

/// Cooperative proof-of-work miner.
#[derive(Clone, Copy, Debug, Default)]
pub struct PowMiner;

impl PowMiner {
    /// Create a miner.
    pub fn new() -> Self {
        Self
    }

    /// Mine `forged_header_hex` at `priority`, optionally committing
    /// `seed_nonce_hex`, until the digest clears `threshold`.
    ///
    /// Layout under the hash: forged ‖ priority(2) ‖ pow_header(4) ‖
    /// counter(4) ‖ seed flag [+ seed(32)] ‖ signature placeholder(64).
    /// The first 8 digest bytes, read big-endian, must be ≤ `threshold`.
    ///
    /// # Errors
    ///
    /// `InvalidEvidence` when the header or seed hex is malformed.
    pub async fn mine(
        &self,
        forged_header_hex: &str,
        priority: u16,
        seed_nonce_hex: Option<&str>,
        threshold: u64,
    ) -> Result<MinedHeader, ForgeError> {
        let forged = from_hex(forged_header_hex)?;

        let mut buffer = Vec::with_capacity(forged.len() + 2 + 8 + 33 + 64);
        buffer.extend_from_slice(&forged);
        buffer.extend_from_slice(&priority.to_be_bytes());
        buffer.extend_from_slice(&POW_HEADER);
        let counter_at = buffer.len();
        buffer.extend_from_slice(&[0u8; 4]);
        match seed_nonce_hex {
            Some(seed_hex) => {
                let seed = from_hex(seed_hex)?;
                if seed.len() != 32 {
                    return Err(ForgeError::InvalidEvidence(format!(
                        "seed nonce hash must be 32 bytes, got {}",
                        seed.len()
                    )));
                }
                buffer.push(0xff);
                buffer.extend_from_slice(&seed);
            }
            None => buffer.push(0x00),
        }
        buffer.extend_from_slice(&SIGNATURE_PLACEHOLDER);

        let mut counter: u32 = 0;
        let mut attempts: u64 = 0;
        loop {
            buffer[counter_at..counter_at + 4].copy_from_slice(&counter.to_be_bytes());
            attempts += 1;

            let digest = blake2b_256(&buffer);
            let mut leading = [0u8; 8];
            leading.copy_from_slice(&digest[..8]);
            if u64::from_be_bytes(leading) <= threshold {
                debug!("[pow] Nonce found after {} attempts", attempts);
                buffer.truncate(buffer.len() - SIGNATURE_PLACEHOLDER.len());
                return Ok(MinedHeader {
                    bytes: buffer,
                    attempts,
                });
            }

            counter = counter.wrapping_add(1);
            if attempts % YIELD_BATCH == 0 {
                // let the scheduler tick and network I/O run
                tokio::task::yield_now().await;
            }
        }
    }
}
