//! Baking engine.
//!
//! Per-level state machine: rights are checked once per level, a due slot is
//! assembled (mempool sweep → preapply → forge → proof-of-work → sign) and
//! held as a pending block until its timestamp arrives. Pending blocks whose
//! level the chain has already passed are superseded and dropped; a failed
//! injection is a missed slot, terminal by protocol.

use crate::ports::ChainClient;
use crate::EngineError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use shared_codec::base58::{b58check_encode, Prefix};
use shared_crypto::{blake2b_256, KeyPair};
use shared_types::{BakingRight, BlockSnapshot, SeedNonce};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};
use tzb_forge::operation::pass_of_kind;
use tzb_forge::PowMiner;
use tzb_rpc::ConstantsCell;

/// Grace period after a slot's estimated time before assembling.
const BAKE_GRACE_SECONDS: i64 = 5;
/// Highest priority worth baking at.
const MAX_PRIORITY: i32 = 5;
/// Validation passes per block.
const PASSES: usize = 4;

/// A mined, signed block waiting for its injection timestamp.
#[derive(Clone, Debug)]
pub struct PendingBlock {
    /// Level the block is for
    pub level: i32,
    /// Priority it was baked at
    pub priority: i32,
    /// Earliest injection time
    pub timestamp: DateTime<Utc>,
    /// Ready injection body (`data` ‖ per-pass operations)
    pub injection_body: Value,
    /// Committed seed nonce hash (`nce...`), when this is a commitment level
    pub seed_nonce_hash: Option<String>,
    /// The committed seed, hex
    pub seed: Option<String>,
}

/// The per-head-tick baking decision loop.
pub struct BakingEngine {
    chain: Arc<dyn ChainClient>,
    constants: Arc<ConstantsCell>,
    miner: PowMiner,
    /// Levels already decided (baked, or no rights). Terminal per level.
    baked: Mutex<HashSet<i32>>,
    pending: Mutex<Vec<PendingBlock>>,
}

impl BakingEngine {
    /// Create the engine.
    pub fn new(chain: Arc<dyn ChainClient>, constants: Arc<ConstantsCell>) -> Self {
        Self {
            chain,
            constants,
            miner: PowMiner::new(),
            baked: Mutex::new(HashSet::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Pending blocks awaiting injection (for status surfaces and tests).
    pub fn pending_levels(&self) -> Vec<i32> {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|p| p.level)
            .collect()
    }

    /// One tick against a fresh head.
    ///
    /// Returns the seed nonces committed by blocks injected during this
    /// tick; the caller hands them to the reveal subsystem.
    pub async fn tick(
        &self,
        keys: &KeyPair,
        head: &BlockSnapshot,
    ) -> Result<Vec<SeedNonce>, EngineError> {
        let mut committed = Vec::new();

        // re-evaluate pending blocks first: supersede, inject, or keep
        let pending: Vec<PendingBlock> = {
            let mut guard = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            guard.drain(..).collect()
        };
        let mut keep = Vec::new();
        for block in pending {
            if block.level <= head.level() {
                info!(
                    "[baking] Pending block at level {} superseded by head {}",
                    block.level,
                    head.level()
                );
                continue;
            }
            if Utc::now() >= block.timestamp {
                match self.chain.inject_block(&block.injection_body).await {
                    Ok(hash) => {
                        info!(
                            "[baking] Injected block {} at level {} (priority {})",
                            hash, block.level, block.priority
                        );
                        if let (Some(nonce_hash), Some(seed)) =
                            (&block.seed_nonce_hash, &block.seed)
                        {
                            committed.push(SeedNonce {
                                hash,
                                seed_nonce_hash: nonce_hash.clone(),
                                seed: seed.clone(),
                                level: block.level,
                                revealed: false,
                            });
                        }
                    }
                    Err(e) => {
                        // a missed slot is a missed slot
                        error!(
                            "[baking] Injection failed at level {}, dropping block: {}",
                            block.level, e
                        );
                    }
                }
            } else {
                keep.push(block);
            }
        }
        {
            let mut guard = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            guard.extend(keep);
        }

        // decide the next level once
        let next = head.level() + 1;
        {
            let mut baked = self.baked.lock().unwrap_or_else(|e| e.into_inner());
            baked.retain(|level| *level > head.level());
            if baked.contains(&next) {
                return Ok(committed);
            }
        }

        let rights = self
            .chain
            .baking_rights(&keys.public_key_hash, next, MAX_PRIORITY)
            .await?;
        let right = rights
            .into_iter()
            .filter(|r| r.delegate == keys.public_key_hash && r.level == next)
            .min_by_key(|r| r.priority);

        let Some(right) = right else {
            debug!("[baking] No rights at level {}", next);
            self.mark_decided(next);
            return Ok(committed);
        };

        let slot_time = right.estimated_time.unwrap_or_else(Utc::now);
        if Utc::now() < slot_time + ChronoDuration::seconds(BAKE_GRACE_SECONDS) {
            // not due yet; the next tick re-checks
            return Ok(committed);
        }

        info!(
            "[baking] Baking level {} at priority {}",
            right.level, right.priority
        );
        let block = self.assemble(keys, head, &right, slot_time).await?;
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(block);
        self.mark_decided(next);

        Ok(committed)
    }

    fn mark_decided(&self, level: i32) {
        self.baked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(level);
    }

    /// Assemble, mine and sign a block for `right`.
    async fn assemble(
        &self,
        keys: &KeyPair,
        head: &BlockSnapshot,
        right: &BakingRight,
        slot_time: DateTime<Utc>,
    ) -> Result<PendingBlock, EngineError> {
        let constants = self.constants.get();

        // commitment levels must commit a fresh seed
        let commitment = right.level % constants.blocks_per_commitment == 0;
        let (seed, seed_digest) = if commitment {
            let mut bytes = [0u8; 32];
            rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
            let digest = blake2b_256(&bytes);
            (Some(hex::encode(bytes)), Some(digest))
        } else {
            (None, None)
        };
        let seed_nonce_hash = match seed_digest {
            Some(digest) => Some(b58check_encode(Prefix::Nce, &digest).map_err(
                tzb_forge::ForgeError::from,
            )?),
            None => None,
        };

        // sweep the mempool; an unreachable mempool just means an emptier block
        let applied = match self.chain.pending_operations().await {
            Ok(pending) => pending.applied,
            Err(e) => {
                warn!("[baking] Mempool sweep failed, baking without operations: {}", e);
                Vec::new()
            }
        };
        let passes = group_into_passes(&head.protocol, &applied);

        let fake_signature =
            b58check_encode(Prefix::EdSig, &[0u8; 64]).map_err(tzb_forge::ForgeError::from)?;
        let mut protocol_data = json!({
            "protocol": head.protocol,
            "priority": right.priority,
            "proof_of_work_nonce": "0000000000000000",
            "signature": fake_signature,
        });
        if let Some(nonce_hash) = &seed_nonce_hash {
            protocol_data["seed_nonce_hash"] = json!(nonce_hash);
        }

        let preapply_body = json!({
            "protocol_data": protocol_data,
            "operations": passes,
        });
        let preapplied = self
            .chain
            .preapply_block(&preapply_body, slot_time.timestamp())
            .await?;

        let forged = self
            .chain
            .forge_block_header(&preapplied.shell_header)
            .await?;

        let mined = self
            .miner
            .mine(
                &forged,
                right.priority as u16,
                seed_digest.map(hex::encode).as_deref(),
                constants.pow_threshold(),
            )
            .await?;
        debug!(
            "[baking] Proof of work found for level {} after {} attempts",
            right.level, mined.attempts
        );

        let signed = keys.sign(&mined.bytes, shared_codec::Watermark::Block)?;

        let injection_body = json!({
            "data": signed.signed_bytes,
            "operations": injection_operations(&preapplied.operations),
        });

        Ok(PendingBlock {
            level: right.level,
            priority: right.priority,
            timestamp: slot_time,
            injection_body,
            seed_nonce_hash,
            seed,
        })
    }
}

/// Bucket applied mempool operations into the four validation passes,
/// re-shaped the way `preapply/block` expects them.
fn group_into_passes(protocol: &str, applied: &[Value]) -> Vec<Vec<Value>> {
    let mut passes: Vec<Vec<Value>> = vec![Vec::new(); PASSES];
    for operation in applied {
        let kind = operation
            .get("contents")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("kind"))
            .and_then(|k| k.as_str());
        let Some(pass) = kind.and_then(pass_of_kind) else {
            continue;
        };
        passes[pass as usize].push(json!({
            "protocol": protocol,
            "branch": operation.get("branch").cloned().unwrap_or(Value::Null),
            "contents": operation.get("contents").cloned().unwrap_or(Value::Null),
            "signature": operation.get("signature").cloned().unwrap_or(Value::Null),
        }));
    }
    passes
}

/// Convert preapply per-pass results into the `[[{branch, data}]]` shape
/// the injection endpoint takes.
fn injection_operations(passes: &[Value]) -> Value {
    let converted: Vec<Value> = passes
        .iter()
        .map(|pass| {
            let applied = pass
                .get("applied")
                .and_then(|a| a.as_array())
                .cloned()
                .unwrap_or_default();
            Value::Array(
                applied
                    .iter()
                    .map(|op| {
                        json!({
                            "branch": op.get("branch").cloned().unwrap_or(Value::Null),
                            "data": op.get("data").cloned().unwrap_or(Value::Null),
                        })
                    })
                    .collect(),
            )
        })
        .collect();
    Value::Array(converted)
}
