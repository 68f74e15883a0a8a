//! Seed nonce reveal subsystem.
//!
//! Committed nonces must be revealed inside the cycle window
//! `[floor(level / blocks_per_cycle) * blocks_per_cycle, +blocks_per_cycle)`.
//! The list is persistence-backed so nonces survive restarts; a nonce whose
//! window has passed is dropped with an error log; the protocol offers no
//! way to reveal late.

use crate::ports::ChainClient;
use crate::EngineError;
use serde_json::json;
use shared_codec::Watermark;
use shared_crypto::KeyPair;
use shared_types::{BakerStore, BlockSnapshot, SeedNonce};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tzb_forge::{forge_operations, verify_against_remote, OperationContent};
use tzb_rpc::ConstantsCell;

/// An injected reveal we have not yet seen on chain.
#[derive(Clone, Debug)]
struct PendingReveal {
    operation_hash: String,
    injected_at_level: i32,
}

/// Levels to keep watching an injected reveal before re-injecting.
const REVEAL_PATIENCE_LEVELS: i32 = 2;

/// Persistence-backed nonce reveal loop.
pub struct NonceRevealer {
    chain: Arc<dyn ChainClient>,
    constants: Arc<ConstantsCell>,
    store: Arc<dyn BakerStore>,
    nonces: Mutex<Vec<SeedNonce>>,
    pending: Mutex<HashMap<String, PendingReveal>>,
}

impl NonceRevealer {
    /// Create the revealer; call [`NonceRevealer::load`] before ticking.
    pub fn new(
        chain: Arc<dyn ChainClient>,
        constants: Arc<ConstantsCell>,
        store: Arc<dyn BakerStore>,
    ) -> Self {
        Self {
            chain,
            constants,
            store,
            nonces: Mutex::new(Vec::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Restore unrevealed nonces from the store. Absence is a first run.
    pub async fn load(&self) {
        match self.store.get_baker_nonces().await {
            Ok(stored) => {
                let unrevealed = stored.iter().filter(|n| !n.revealed).count();
                if unrevealed > 0 {
                    info!("[nonces] Restored {} unrevealed nonce(s)", unrevealed);
                }
                *self.nonces.lock().await = stored;
            }
            Err(e) => warn!("[nonces] Could not restore nonces, starting empty: {}", e),
        }
    }

    /// Track a nonce committed by a freshly injected block.
    pub async fn add(&self, nonce: SeedNonce) {
        info!(
            "[nonces] Tracking committed nonce for level {} ({})",
            nonce.level, nonce.seed_nonce_hash
        );
        let mut nonces = self.nonces.lock().await;
        nonces.push(nonce);
        self.persist(&nonces).await;
    }

    /// Unrevealed nonce count (for status surfaces and tests).
    pub async fn unrevealed(&self) -> usize {
        self.nonces.lock().await.iter().filter(|n| !n.revealed).count()
    }

    /// One tick: confirm pending reveals, drop expired nonces, inject
    /// reveals for nonces inside their window.
    pub async fn tick(&self, keys: &KeyPair, head: &BlockSnapshot) -> Result<(), EngineError> {
        let level = head.level();
        let blocks_per_cycle = self.constants.get().blocks_per_cycle;

        self.confirm_pending(head).await;

        let mut nonces = self.nonces.lock().await;
        let mut dirty = false;
        let mut keep = Vec::with_capacity(nonces.len());

        for nonce in nonces.drain(..) {
            if nonce.revealed {
                // retained until its cycle ends, then garbage collected
                let window_end =
                    (nonce.level / blocks_per_cycle) * blocks_per_cycle + blocks_per_cycle;
                if level < window_end {
                    keep.push(nonce);
                } else {
                    dirty = true;
                }
                continue;
            }

            let window_start = (nonce.level / blocks_per_cycle) * blocks_per_cycle;
            let window_end = window_start + blocks_per_cycle;

            if level >= window_end {
                // should not normally happen; the reveal window was missed
                error!(
                    "[nonces] Reveal window for level {} passed (head {}), dropping nonce",
                    nonce.level, level
                );
                self.pending.lock().await.remove(&nonce.seed_nonce_hash);
                dirty = true;
                continue;
            }

            if level >= window_start && !self.has_pending(&nonce.seed_nonce_hash).await {
                match self.inject_reveal(keys, head, &nonce).await {
                    Ok(operation_hash) => {
                        self.pending.lock().await.insert(
                            nonce.seed_nonce_hash.clone(),
                            PendingReveal {
                                operation_hash,
                                injected_at_level: level,
                            },
                        );
                    }
                    Err(e) => warn!(
                        "[nonces] Reveal injection for level {} failed, retrying next tick: {}",
                        nonce.level, e
                    ),
                }
            }
            keep.push(nonce);
        }

        *nonces = keep;
        if dirty {
            self.persist(&nonces).await;
        }
        Ok(())
    }

    async fn has_pending(&self, seed_nonce_hash: &str) -> bool {
        self.pending.lock().await.contains_key(seed_nonce_hash)
    }

    /// Check injected reveals against the head block; mark confirmed ones
    /// revealed, forget stale ones so the next tick re-injects.
    async fn confirm_pending(&self, head: &BlockSnapshot) {
        let snapshot: Vec<(String, PendingReveal)> = {
            let pending = self.pending.lock().await;
            pending.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        if snapshot.is_empty() {
            return;
        }

        let included: Vec<String> = match self.chain.operation_hashes(&head.hash).await {
            Ok(hashes) => hashes.into_iter().flatten().collect(),
            Err(_) => return,
        };

        for (nonce_hash, reveal) in snapshot {
            if included.contains(&reveal.operation_hash) {
                info!(
                    "[nonces] Reveal {} confirmed in {}",
                    reveal.operation_hash, head.hash
                );
                let mut nonces = self.nonces.lock().await;
                for nonce in nonces.iter_mut() {
                    if nonce.seed_nonce_hash == nonce_hash {
                        nonce.revealed = true;
                    }
                }
                self.persist(&nonces).await;
                self.pending.lock().await.remove(&nonce_hash);
            } else if head.level() > reveal.injected_at_level + REVEAL_PATIENCE_LEVELS {
                // not seen for a while; forget it and re-inject next tick
                warn!(
                    "[nonces] Reveal {} not seen after {} levels, will re-inject",
                    reveal.operation_hash, REVEAL_PATIENCE_LEVELS
                );
                self.pending.lock().await.remove(&nonce_hash);
            }
        }
    }

    async fn inject_reveal(
        &self,
        keys: &KeyPair,
        head: &BlockSnapshot,
        nonce: &SeedNonce,
    ) -> Result<String, EngineError> {
        info!(
            "[nonces] Revealing nonce committed at level {} ({})",
            nonce.level, nonce.seed_nonce_hash
        );

        let contents = vec![OperationContent::SeedNonceRevelation {
            level: nonce.level,
            nonce: nonce.seed.clone(),
        }];
        let local = forge_operations(&head.hash, &contents)?;

        let body = json!({
            "branch": head.hash,
            "contents": contents.iter().map(|c| c.to_json()).collect::<Vec<_>>(),
        });
        let remote = self.chain.forge_operations(&body).await?;
        verify_against_remote(&local, &remote).map_err(|mismatch| {
            error!("[nonces] Forge verification failed: refusing to sign reveal");
            mismatch
        })?;

        let signed = keys.sign(&local, Watermark::Generic)?;
        let hash = self.chain.inject_operation(&signed.signed_bytes).await?;
        info!("[nonces] Injected reveal {}", hash);
        Ok(hash)
    }

    async fn persist(&self, nonces: &[SeedNonce]) {
        if let Err(e) = self.store.set_baker_nonces(nonces.to_vec()).await {
            // keep going on in-memory state
            warn!("[nonces] Persisting nonces failed: {}", e);
        }
    }
}
