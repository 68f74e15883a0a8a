//! Endorsing engine.
//!
//! One shot per level: the level is marked attempted before the operation
//! goes out, success or not. Retrying after a failed injection could land a
//! second endorsement for the same level and hand the network a slashable
//! double-endorsement against the operator's own account.

use crate::ports::ChainClient;
use crate::EngineError;
use serde_json::json;
use shared_codec::Watermark;
use shared_crypto::KeyPair;
use shared_types::BlockSnapshot;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};
use tzb_forge::{forge_operations, verify_against_remote, OperationContent};

/// The per-head-tick endorsing decision loop.
pub struct EndorsingEngine {
    chain: Arc<dyn ChainClient>,
    /// Levels already attempted. Never retried.
    endorsed: Mutex<HashSet<i32>>,
}

impl EndorsingEngine {
    /// Create the engine.
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self {
            chain,
            endorsed: Mutex::new(HashSet::new()),
        }
    }

    /// Whether `level` was already attempted.
    pub fn attempted(&self, level: i32) -> bool {
        self.endorsed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&level)
    }

    fn mark_attempted(&self, level: i32) {
        let mut endorsed = self.endorsed.lock().unwrap_or_else(|e| e.into_inner());
        endorsed.retain(|l| *l + 64 > level);
        endorsed.insert(level);
    }

    /// One tick against a fresh head: endorse the head's level if a slot is
    /// assigned and the level was not attempted yet.
    pub async fn tick(&self, keys: &KeyPair, head: &BlockSnapshot) -> Result<(), EngineError> {
        let level = head.level();
        if self.attempted(level) {
            return Ok(());
        }

        let rights = self
            .chain
            .endorsing_rights(&keys.public_key_hash, level)
            .await?;
        let slots: Vec<u16> = rights
            .into_iter()
            .filter(|r| r.delegate == keys.public_key_hash && r.level == level)
            .flat_map(|r| r.slots)
            .collect();

        if slots.is_empty() {
            debug!("[endorse] No slots at level {}", level);
            self.mark_attempted(level);
            return Ok(());
        }

        // attempt recorded before anything leaves this process
        self.mark_attempted(level);
        info!(
            "[endorse] Endorsing level {} ({} slots)",
            level,
            slots.len()
        );

        let contents = vec![OperationContent::Endorsement { level }];
        let local = forge_operations(&head.hash, &contents)?;

        let body = json!({
            "branch": head.hash,
            "contents": contents.iter().map(|c| c.to_json()).collect::<Vec<_>>(),
        });
        let remote = self.chain.forge_operations(&body).await?;
        if let Err(mismatch) = verify_against_remote(&local, &remote) {
            error!("[endorse] Forge verification failed at level {}: refusing to sign", level);
            return Err(mismatch.into());
        }

        let signed = keys.sign(&local, Watermark::Endorsement)?;
        match self.chain.inject_operation(&signed.signed_bytes).await {
            Ok(hash) => info!("[endorse] Injected endorsement {} for level {}", hash, level),
            Err(e) => {
                // attempted stays marked: injecting again risks a double
                // endorsement if the first one actually landed
                error!("[endorse] Injection failed at level {}: {}", level, e);
                return Err(e.into());
            }
        }
        Ok(())
    }
}
