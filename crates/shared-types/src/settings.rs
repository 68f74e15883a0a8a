//! Baker settings consumed by the core.
//!
//! The core never reads environment variables or files; the runtime binary
//! builds this struct and passes it down.

use serde::{Deserialize, Serialize};

/// Plain settings struct handed to the controller at start.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakerSettings {
    /// Node RPC base address
    pub node_url: String,
    /// Indexer API base address
    pub indexer_url: String,
    /// Operator fee retained from delegator rewards, in percent
    #[serde(default = "defaults::operator_fee_percent")]
    pub operator_fee_percent: f64,
    /// Maximum payouts per reward transaction batch
    #[serde(default = "defaults::reward_batch_size")]
    pub reward_batch_size: usize,
    /// Bake when rights arrive
    #[serde(default = "defaults::enabled")]
    pub baking: bool,
    /// Endorse when slots are assigned
    #[serde(default = "defaults::enabled")]
    pub endorsing: bool,
    /// Scan recent predecessors for double baking/endorsing
    #[serde(default = "defaults::enabled")]
    pub accusing: bool,
    /// Distribute delegation rewards
    #[serde(default)]
    pub rewarding: bool,
}

impl BakerSettings {
    /// Settings pointing at local sandbox endpoints, for tests and dev runs.
    pub fn sandbox() -> Self {
        Self {
            node_url: "http://127.0.0.1:8732".into(),
            indexer_url: "http://127.0.0.1:8080".into(),
            operator_fee_percent: defaults::operator_fee_percent(),
            reward_batch_size: defaults::reward_batch_size(),
            baking: true,
            endorsing: true,
            accusing: true,
            rewarding: false,
        }
    }
}

mod defaults {
    pub fn operator_fee_percent() -> f64 {
        10.0
    }
    pub fn reward_batch_size() -> usize {
        25
    }
    pub fn enabled() -> bool {
        true
    }
}
