//! Domain entities shared across the baker crates.
//!
//! Block, right and operation types mirror the node's JSON shapes; fields the
//! baker never reads are left out and ignored during deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The delegate's key material for one baking session.
///
/// `secret_key` is an `edsk...` string, or an `edesk...` ciphertext when
/// `encrypted` is set. Encrypted keys are never persisted in plaintext;
/// decryption happens in memory at controller start.
#[derive(Clone, Serialize, Deserialize)]
pub struct BakerKeys {
    /// Secret key (`edsk...`) or encrypted secret key (`edesk...`)
    pub secret_key: String,
    /// Public key (`edpk...`)
    pub public_key: String,
    /// Public key hash (`tz1...`)
    pub public_key_hash: String,
    /// Whether `secret_key` is an `edesk` ciphertext
    pub encrypted: bool,
}

// Manual Debug keeps the secret out of logs.
impl std::fmt::Debug for BakerKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BakerKeys")
            .field("public_key_hash", &self.public_key_hash)
            .field("encrypted", &self.encrypted)
            .finish_non_exhaustive()
    }
}

/// Shell header of a block, as returned under `header` by the node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShellHeader {
    /// Block level (height)
    pub level: i32,
    /// Protocol number within the chain history
    #[serde(default)]
    pub proto: u8,
    /// Predecessor block hash (`B...`)
    pub predecessor: String,
    /// Block timestamp
    pub timestamp: DateTime<Utc>,
    /// Fitness vector (hex components)
    #[serde(default)]
    pub fitness: Vec<String>,
    /// Priority the block was baked at (protocol header field)
    #[serde(default)]
    pub priority: Option<i32>,
}

/// Level bookkeeping the node attaches under `metadata.level`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LevelInfo {
    /// Block level
    pub level: i32,
    /// Cycle the level belongs to
    #[serde(default)]
    pub cycle: i32,
    /// Position of the level inside its cycle
    #[serde(default)]
    pub cycle_position: i32,
}

/// Block metadata subset the engines read.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Delegate that baked this block
    #[serde(default)]
    pub baker: Option<String>,
    /// Level bookkeeping
    #[serde(default)]
    pub level: Option<LevelInfo>,
}

/// One operation inside a block's validation-pass lists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OperationView {
    /// Operation hash (`o...`), present on included operations
    #[serde(default)]
    pub hash: Option<String>,
    /// Branch the operation points at
    #[serde(default)]
    pub branch: Option<String>,
    /// Operation contents; the accuser digs `kind`, `level` and
    /// `metadata.delegate` out of these
    #[serde(default)]
    pub contents: Vec<serde_json::Value>,
}

/// Immutable snapshot of a block (the head or a predecessor).
///
/// Fetched fresh each controller tick and superseded by the next fetch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockSnapshot {
    /// Protocol hash (`P...`)
    pub protocol: String,
    /// Chain id (`Net...`)
    pub chain_id: String,
    /// Block hash (`B...`)
    pub hash: String,
    /// Shell header
    pub header: ShellHeader,
    /// Metadata subset
    #[serde(default)]
    pub metadata: Option<BlockMetadata>,
    /// Operations grouped by validation pass
    #[serde(default)]
    pub operations: Vec<Vec<OperationView>>,
}

impl BlockSnapshot {
    /// Level of this block.
    pub fn level(&self) -> i32 {
        self.header.level
    }

    /// Cycle of this block, when the node supplied metadata.
    pub fn cycle(&self) -> Option<i32> {
        self.metadata
            .as_ref()
            .and_then(|m| m.level.as_ref())
            .map(|l| l.cycle)
    }
}

/// A baking slot assigned to the delegate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakingRight {
    /// Level the right applies to
    pub level: i32,
    /// Delegate holding the right
    pub delegate: String,
    /// Baking priority (0 is first)
    pub priority: i32,
    /// Earliest timestamp the block is accepted at
    #[serde(default)]
    pub estimated_time: Option<DateTime<Utc>>,
}

/// An endorsing slot assignment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndorsingRight {
    /// Level the right applies to
    pub level: i32,
    /// Delegate holding the right
    pub delegate: String,
    /// Assigned endorsement slots
    #[serde(default)]
    pub slots: Vec<u16>,
    /// Estimated endorsement time
    #[serde(default)]
    pub estimated_time: Option<DateTime<Utc>>,
}

/// A committed seed nonce awaiting revelation.
///
/// Created when an injected block commits a seed, persisted until the reveal
/// is confirmed included or its cycle window has passed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedNonce {
    /// Hash of the block that committed the nonce
    pub hash: String,
    /// Committed seed nonce hash (`nce...`)
    pub seed_nonce_hash: String,
    /// The 32-byte seed, hex encoded
    pub seed: String,
    /// Level the commitment was made at
    pub level: i32,
    /// Set once the reveal operation is confirmed included
    pub revealed: bool,
}

/// One reward payout recorded for a cycle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SentReward {
    /// Delegator address paid
    pub destination: String,
    /// Net amount in mutez
    pub amount: u64,
    /// Hash of the batch operation that carried this payout
    #[serde(default)]
    pub operation_hash: Option<String>,
    /// Whether the node applied the payout
    pub applied: bool,
}
