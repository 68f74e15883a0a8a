//! Scripted mock node for engine scenarios.
//!
//! Behaves like a cooperative node: the remote forge actually re-forges the
//! submitted contents (so forge verification passes against honest inputs),
//! injected operations are auto-included in the next `operation_hashes`
//! answer, and every interaction is recorded for assertions.

use async_trait::async_trait;
use serde_json::{json, Value};
use shared_types::{BakingRight, BlockSnapshot, EndorsingRight, NetworkConstants};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tzb_engine::ChainClient;
use tzb_forge::{forge_operations, ManagerMeta, OperationContent};
use tzb_rpc::{PendingOperations, PreappliedBlock, RpcError};

/// Deterministic, well-formed block hash from a short tag. The engines
/// decode the head hash as a forge branch, so it must be real Base58Check.
pub fn block_hash(tag: &str) -> String {
    let mut payload = [0u8; 32];
    let bytes = tag.as_bytes();
    let n = bytes.len().min(32);
    payload[..n].copy_from_slice(&bytes[..n]);
    shared_codec::base58::b58check_encode(shared_codec::Prefix::Block, &payload)
        .expect("fixed-length payload")
}

/// Build a minimal block snapshot for tests; `tag` seeds the block hash.
pub fn block(tag: &str, level: i32, baker: Option<&str>) -> BlockSnapshot {
    serde_json::from_value(json!({
        "protocol": "PsBabyM1eUXZseaJdmXFApDSBqj8YBfwELoxZHHW77EMcAbbwAS",
        "chain_id": "NetXdQprcVkpaWU",
        "hash": block_hash(tag),
        "header": {
            "level": level,
            "proto": 5,
            "predecessor": "BPredecessorPredecessorPredecessor",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "fitness": []
        },
        "metadata": {
            "baker": baker,
            "level": { "level": level, "cycle": level / 4096, "cycle_position": level % 4096 }
        },
        "operations": [[], [], [], []]
    }))
    .expect("valid test block")
}

/// Constants with an accept-everything proof-of-work threshold.
pub fn test_constants() -> NetworkConstants {
    let mut constants = NetworkConstants::mainnet();
    // -1 parses to an all-ones threshold: every digest clears it
    constants.proof_of_work_threshold = "-1".into();
    constants
}

/// A scripted, recording [`ChainClient`].
#[derive(Default)]
pub struct MockChain {
    /// Current head; swap it between ticks to advance the chain
    pub head: Mutex<Option<BlockSnapshot>>,
    /// Blocks by id (hashes and `hash~n` forms)
    pub blocks: Mutex<HashMap<String, BlockSnapshot>>,
    /// Scripted baking rights
    pub baking_rights: Mutex<Vec<BakingRight>>,
    /// Scripted endorsing rights
    pub endorsing_rights: Mutex<Vec<EndorsingRight>>,
    /// On-chain counter for every source
    pub counter_value: AtomicU64,
    /// Whether the manager key is revealed
    pub manager_key_revealed: std::sync::atomic::AtomicBool,
    /// Injected operation hex payloads, in order
    pub injected_operations: Mutex<Vec<String>>,
    /// Injected block bodies, in order
    pub injected_blocks: Mutex<Vec<Value>>,
    /// Hashes reported as included (auto-fed by `inject_operation`)
    pub included: Mutex<Vec<String>>,
    /// Artificial delay inside `inject_operation`, to widen race windows
    pub inject_delay: Mutex<Option<Duration>>,
    /// Counter of baking-rights fetches
    pub baking_rights_fetches: AtomicU32,
    /// Counter of endorsing-rights fetches
    pub endorsing_rights_fetches: AtomicU32,
    /// Counter of on-chain counter fetches
    pub counter_fetches: AtomicU32,
    /// When set, the remote forge returns garbage (a lying node)
    pub lying_forge: std::sync::atomic::AtomicBool,
}

impl MockChain {
    /// New mock with a revealed manager key and counter 0.
    pub fn new() -> Self {
        let mock = Self::default();
        mock.manager_key_revealed.store(true, Ordering::SeqCst);
        mock
    }

    /// Replace the head (and index it under its hash).
    pub fn set_head(&self, snapshot: BlockSnapshot) {
        self.blocks
            .lock()
            .unwrap()
            .insert(snapshot.hash.clone(), snapshot.clone());
        *self.head.lock().unwrap() = Some(snapshot);
    }

    /// Register a block under an explicit id (e.g. `"Bhead~1"`).
    pub fn put_block(&self, id: &str, snapshot: BlockSnapshot) {
        self.blocks.lock().unwrap().insert(id.to_string(), snapshot);
    }

    fn next_operation_hash(&self) -> String {
        format!("op{}", self.injected_operations.lock().unwrap().len() + 1)
    }
}

/// Rebuild typed contents from node-shaped JSON, the way a real node parses
/// a forge request. Supports the kinds the engines actually send.
fn content_from_json(value: &Value) -> Option<OperationContent> {
    let kind = value.get("kind")?.as_str()?;
    let manager_meta = || -> Option<ManagerMeta> {
        Some(ManagerMeta {
            source: value.get("source")?.as_str()?.to_string(),
            fee: value.get("fee")?.as_str()?.parse().ok()?,
            counter: value.get("counter")?.as_str()?.parse().ok()?,
            gas_limit: value.get("gas_limit")?.as_str()?.parse().ok()?,
            storage_limit: value.get("storage_limit")?.as_str()?.parse().ok()?,
        })
    };
    match kind {
        "endorsement" => Some(OperationContent::Endorsement {
            level: value.get("level")?.as_i64()? as i32,
        }),
        "seed_nonce_revelation" => Some(OperationContent::SeedNonceRevelation {
            level: value.get("level")?.as_i64()? as i32,
            nonce: value.get("nonce")?.as_str()?.to_string(),
        }),
        "reveal" => Some(OperationContent::Reveal {
            meta: manager_meta()?,
            public_key: value.get("public_key")?.as_str()?.to_string(),
        }),
        "transaction" => Some(OperationContent::Transaction {
            meta: manager_meta()?,
            amount: value.get("amount")?.as_str()?.parse().ok()?,
            destination: value.get("destination")?.as_str()?.to_string(),
        }),
        "delegation" => Some(OperationContent::Delegation {
            meta: manager_meta()?,
            delegate: value
                .get("delegate")
                .and_then(|d| d.as_str())
                .map(String::from),
        }),
        _ => None,
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn head(&self) -> Result<BlockSnapshot, RpcError> {
        self.head
            .lock()
            .unwrap()
            .clone()
            .ok_or(RpcError::EmptyResponse)
    }

    async fn block(&self, block_id: &str) -> Result<BlockSnapshot, RpcError> {
        self.blocks
            .lock()
            .unwrap()
            .get(block_id)
            .cloned()
            .ok_or_else(|| RpcError::Protocol(format!("unknown block {}", block_id)))
    }

    async fn operation_hashes(&self, _block_id: &str) -> Result<Vec<Vec<String>>, RpcError> {
        let included = self.included.lock().unwrap().clone();
        Ok(vec![vec![], vec![], vec![], included])
    }

    async fn constants(&self) -> Result<NetworkConstants, RpcError> {
        Ok(test_constants())
    }

    async fn baking_rights(
        &self,
        delegate: &str,
        level: i32,
        _max_priority: i32,
    ) -> Result<Vec<BakingRight>, RpcError> {
        self.baking_rights_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .baking_rights
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.delegate == delegate && r.level == level)
            .cloned()
            .collect())
    }

    async fn endorsing_rights(
        &self,
        delegate: &str,
        level: i32,
    ) -> Result<Vec<EndorsingRight>, RpcError> {
        self.endorsing_rights_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .endorsing_rights
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.delegate == delegate && r.level == level)
            .cloned()
            .collect())
    }

    async fn counter(&self, _pkh: &str) -> Result<u64, RpcError> {
        self.counter_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.counter_value.load(Ordering::SeqCst))
    }

    async fn manager_key(&self, _pkh: &str) -> Result<Option<String>, RpcError> {
        if self.manager_key_revealed.load(Ordering::SeqCst) {
            Ok(Some("edpk-revealed".into()))
        } else {
            Ok(None)
        }
    }

    async fn pending_operations(&self) -> Result<PendingOperations, RpcError> {
        Ok(PendingOperations::default())
    }

    async fn forge_operations(&self, body: &Value) -> Result<String, RpcError> {
        if self.lying_forge.load(Ordering::SeqCst) {
            return Ok("00".into());
        }
        // re-forge honestly, as the node would
        let branch = body
            .get("branch")
            .and_then(|b| b.as_str())
            .ok_or_else(|| RpcError::Protocol("missing branch".into()))?;
        let contents: Vec<OperationContent> = body
            .get("contents")
            .and_then(|c| c.as_array())
            .map(|contents| contents.iter().filter_map(content_from_json).collect())
            .unwrap_or_default();
        let forged = forge_operations(branch, &contents)
            .map_err(|e| RpcError::Protocol(e.to_string()))?;
        Ok(hex::encode(forged))
    }

    async fn forge_block_header(&self, _shell_header: &Value) -> Result<String, RpcError> {
        Ok("deadbeef".into())
    }

    async fn preapply_block(
        &self,
        body: &Value,
        _timestamp: i64,
    ) -> Result<PreappliedBlock, RpcError> {
        // pass the candidate's operations straight back as applied
        let operations = body
            .get("operations")
            .and_then(|o| o.as_array())
            .cloned()
            .unwrap_or_default();
        let passes: Vec<Value> = operations
            .iter()
            .map(|pass| json!({ "applied": pass }))
            .collect();
        Ok(PreappliedBlock {
            shell_header: json!({"level": 0}),
            operations: passes,
        })
    }

    async fn preapply_operations(&self, _body: &Value) -> Result<Vec<Value>, RpcError> {
        Ok(vec![])
    }

    async fn inject_block(&self, body: &Value) -> Result<String, RpcError> {
        let mut injected = self.injected_blocks.lock().unwrap();
        injected.push(body.clone());
        Ok(format!("Binjected{}", injected.len()))
    }

    async fn inject_operation(&self, signed_hex: &str) -> Result<String, RpcError> {
        let delay = *self.inject_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let hash = self.next_operation_hash();
        self.injected_operations
            .lock()
            .unwrap()
            .push(signed_hex.to_string());
        self.included.lock().unwrap().push(hash.clone());
        Ok(hash)
    }
}
