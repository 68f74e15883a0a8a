//! Network constants fetched from the node's context.
//!
//! Read-mostly shared state: loaded once at controller start (and on explicit
//! reload), read pervasively by the codec, miner, forge and engines.

use serde::{Deserialize, Serialize};

/// Subset of `context/constants` the baker consumes.
///
/// The node serializes 64-bit and mutez quantities as strings; accessors
/// parse them once and fall back to protocol defaults on absence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConstants {
    /// Seconds between blocks per priority step (strings on the wire)
    #[serde(default = "defaults::time_between_blocks")]
    pub time_between_blocks: Vec<String>,
    /// Levels per cycle
    #[serde(default = "defaults::blocks_per_cycle")]
    pub blocks_per_cycle: i32,
    /// Levels between nonce commitments
    #[serde(default = "defaults::blocks_per_commitment")]
    pub blocks_per_commitment: i32,
    /// Cycles the protocol keeps rights/snapshots for
    #[serde(default = "defaults::preserved_cycles")]
    pub preserved_cycles: i32,
    /// Endorsement slots per block
    #[serde(default = "defaults::endorsers_per_block")]
    pub endorsers_per_block: u16,
    /// Proof-of-work acceptance threshold (string on the wire)
    #[serde(default = "defaults::proof_of_work_threshold")]
    pub proof_of_work_threshold: String,
}

impl NetworkConstants {
    /// Mainnet protocol defaults, used until the node has been queried.
    pub fn mainnet() -> Self {
        Self {
            time_between_blocks: defaults::time_between_blocks(),
            blocks_per_cycle: defaults::blocks_per_cycle(),
            blocks_per_commitment: defaults::blocks_per_commitment(),
            preserved_cycles: defaults::preserved_cycles(),
            endorsers_per_block: defaults::endorsers_per_block(),
            proof_of_work_threshold: defaults::proof_of_work_threshold(),
        }
    }

    /// Seconds a priority-0 block must wait after its predecessor.
    pub fn base_block_delay(&self) -> i64 {
        self.time_between_blocks
            .first()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60)
    }

    /// Proof-of-work threshold as the integer the miner compares against.
    pub fn pow_threshold(&self) -> u64 {
        self.proof_of_work_threshold
            .parse::<i64>()
            .map(|v| v as u64)
            .unwrap_or(u64::MAX >> 20)
    }

    /// First level of the cycle containing `level`.
    pub fn cycle_start(&self, level: i32) -> i32 {
        (level / self.blocks_per_cycle) * self.blocks_per_cycle
    }

    /// Cycle number containing `level`.
    pub fn cycle_of(&self, level: i32) -> i32 {
        level / self.blocks_per_cycle
    }
}

impl Default for NetworkConstants {
    fn default() -> Self {
        Self::mainnet()
    }
}

mod defaults {
    pub fn time_between_blocks() -> Vec<String> {
        vec!["60".into(), "40".into()]
    }
    pub fn blocks_per_cycle() -> i32 {
        4096
    }
    pub fn blocks_per_commitment() -> i32 {
        32
    }
    pub fn preserved_cycles() -> i32 {
        5
    }
    pub fn endorsers_per_block() -> u16 {
        32
    }
    pub fn proof_of_work_threshold() -> String {
        "70368744177663".into()
    }
}
