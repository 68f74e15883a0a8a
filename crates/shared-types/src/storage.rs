//! Persistent key-value collaborator port.
//!
//! Every method fails independently with a recoverable `StorageError`; the
//! engines treat absent data as "first run" and keep going on in-memory state
//! when persistence is unavailable.

use crate::entities::{BakerKeys, SeedNonce, SentReward};
use crate::settings::BakerSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persistence layer failure. Recoverable by design.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed
    #[error("Storage I/O error: {0}")]
    Io(String),

    /// Stored payload could not be decoded
    #[error("Corrupt stored data: {0}")]
    Corrupt(String),
}

/// Everything the store knows about the operator.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserData {
    /// Saved key material, if any
    #[serde(default)]
    pub keys: Option<BakerKeys>,
    /// Saved settings, if any
    #[serde(default)]
    pub settings: Option<BakerSettings>,
}

/// Async key-value store the baker persists its state through.
#[async_trait]
pub trait BakerStore: Send + Sync {
    /// Saved keys and settings; `Default` when none were stored yet.
    async fn get_user_data(&self) -> Result<UserData, StorageError>;

    /// Persist the delegate's key material.
    async fn set_baker_keys(&self, keys: BakerKeys) -> Result<(), StorageError>;

    /// Persist the settings struct.
    async fn set_baker_settings(&self, settings: BakerSettings) -> Result<(), StorageError>;

    /// Unrevealed nonces from previous sessions; empty on first run.
    async fn get_baker_nonces(&self) -> Result<Vec<SeedNonce>, StorageError>;

    /// Replace the persisted nonce list.
    async fn set_baker_nonces(&self, nonces: Vec<SeedNonce>) -> Result<(), StorageError>;

    /// Watermark of the last fully rewarded cycle.
    async fn get_last_rewarded_cycle(&self) -> Result<Option<i32>, StorageError>;

    /// Advance the rewarded-cycle watermark.
    async fn set_last_rewarded_cycle(&self, cycle: i32) -> Result<(), StorageError>;

    /// Payouts already sent for `cycle`; empty when the cycle is untouched.
    async fn get_sent_rewards_by_cycle(&self, cycle: i32)
        -> Result<Vec<SentReward>, StorageError>;

    /// Replace the sent-payout records for `cycle`.
    async fn set_sent_rewards_by_cycle(
        &self,
        cycle: i32,
        rewards: Vec<SentReward>,
    ) -> Result<(), StorageError>;
}
