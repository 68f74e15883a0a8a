//! Double-bake and double-endorse detection.
//!
//! Scans the most recent predecessors of the head and compares
//! (baker, level) and (endorser, level) pairs across them. A duplicate pair
//! with differing hashes means two conflicting signatures from one delegate
//! and is surfaced as a high-severity alert. Detection only: no accusation
//! operation is injected.

use crate::ports::ChainClient;
use crate::EngineError;
use shared_types::{Alert, AlertSeverity, AlertSink, BlockSnapshot};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Predecessor depth scanned behind the head.
const SCAN_DEPTH: usize = 10;

/// The double-signing detector.
pub struct Accuser {
    chain: Arc<dyn ChainClient>,
    sink: Arc<dyn AlertSink>,
    /// Block hashes already scanned (bounded by pruning below)
    scanned: Mutex<HashSet<String>>,
    /// (baker, level) → block hash
    bakes: Mutex<HashMap<(String, i32), String>>,
    /// (endorser, level) → operation hash (or owning block when unhashed)
    endorsements: Mutex<HashMap<(String, i32), String>>,
}

impl Accuser {
    /// Create the accuser reporting into `sink`.
    pub fn new(chain: Arc<dyn ChainClient>, sink: Arc<dyn AlertSink>) -> Self {
        Self {
            chain,
            sink,
            scanned: Mutex::new(HashSet::new()),
            bakes: Mutex::new(HashMap::new()),
            endorsements: Mutex::new(HashMap::new()),
        }
    }

    /// One tick: scan the head and its recent predecessors.
    ///
    /// Once a predecessor turns out to be already scanned, everything behind
    /// it was scanned on an earlier tick and the walk stops; steady state
    /// costs one fetch per new head.
    pub async fn tick(&self, head: &BlockSnapshot) -> Result<(), EngineError> {
        self.scan_block(head);

        for depth in 1..SCAN_DEPTH {
            let block_id = format!("{}~{}", head.hash, depth);
            match self.chain.block(&block_id).await {
                Ok(block) => {
                    if !self.scan_block(&block) {
                        break;
                    }
                }
                Err(e) => {
                    debug!("[accuser] Could not fetch {}: {}", block_id, e);
                    break;
                }
            }
        }

        self.prune(head.level());
        Ok(())
    }

    /// Record a block's baker and endorsements, raising alerts on conflicts.
    /// Returns false when the block was already scanned.
    fn scan_block(&self, block: &BlockSnapshot) -> bool {
        {
            let mut scanned = self.scanned.lock().unwrap_or_else(|e| e.into_inner());
            if !scanned.insert(block.hash.clone()) {
                return false;
            }
        }

        let level = block.level();

        if let Some(baker) = block.metadata.as_ref().and_then(|m| m.baker.clone()) {
            let mut bakes = self.bakes.lock().unwrap_or_else(|e| e.into_inner());
            match bakes.get(&(baker.clone(), level)) {
                Some(existing) if *existing != block.hash => {
                    let message = format!(
                        "Double baking by {} at level {}: {} vs {}",
                        baker, level, existing, block.hash
                    );
                    warn!("[accuser] {}", message);
                    self.sink.alert(Alert::new(AlertSeverity::High, "accuser", message));
                }
                Some(_) => {}
                None => {
                    bakes.insert((baker, level), block.hash.clone());
                }
            }
        }

        // endorsements live in validation pass 0
        let Some(endorsement_pass) = block.operations.first() else {
            return true;
        };
        for operation in endorsement_pass {
            let op_id = operation
                .hash
                .clone()
                .unwrap_or_else(|| block.hash.clone());
            for content in &operation.contents {
                if content.get("kind").and_then(|k| k.as_str()) != Some("endorsement") {
                    continue;
                }
                let Some(endorsed_level) =
                    content.get("level").and_then(|l| l.as_i64()).map(|l| l as i32)
                else {
                    continue;
                };
                let Some(delegate) = content
                    .get("metadata")
                    .and_then(|m| m.get("delegate"))
                    .and_then(|d| d.as_str())
                else {
                    continue;
                };

                let mut endorsements =
                    self.endorsements.lock().unwrap_or_else(|e| e.into_inner());
                match endorsements.get(&(delegate.to_string(), endorsed_level)) {
                    Some(existing) if *existing != op_id => {
                        let message = format!(
                            "Double endorsing by {} at level {}: {} vs {}",
                            delegate, endorsed_level, existing, op_id
                        );
                        warn!("[accuser] {}", message);
                        self.sink
                            .alert(Alert::new(AlertSeverity::High, "accuser", message));
                    }
                    Some(_) => {}
                    None => {
                        endorsements
                            .insert((delegate.to_string(), endorsed_level), op_id.clone());
                    }
                }
            }
        }
        true
    }

    /// Forget records far behind the head so memory stays bounded.
    fn prune(&self, head_level: i32) {
        let horizon = head_level - (SCAN_DEPTH as i32) * 2;
        self.bakes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(_, level), _| *level >= horizon);
        self.endorsements
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(_, level), _| *level >= horizon);
        let mut scanned = self.scanned.lock().unwrap_or_else(|e| e.into_inner());
        if scanned.len() > SCAN_DEPTH * 8 {
            scanned.clear();
        }
    }
}
