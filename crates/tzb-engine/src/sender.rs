//! Manager-operation send pipeline.
//!
//! Counter operations must be strictly ordered per account, so at most one
//! operation per source may be in flight. Each source gets its own async
//! mutex, acquired before the counter is read and released only when the
//! injection has succeeded or failed. The counter cache saves a refetch per
//! burst; any counter-shaped rejection invalidates it before the error is
//! surfaced.

use crate::ports::ChainClient;
use crate::EngineError;
use serde_json::{json, Value};
use shared_codec::Watermark;
use shared_crypto::KeyPair;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};
use tzb_forge::{forge_operations, verify_against_remote, OperationContent, OperationOptions};
use tzb_rpc::RpcError;

/// Result of a successful send.
#[derive(Clone, Debug)]
pub struct SendOutcome {
    /// Hash of the injected operation
    pub operation_hash: String,
    /// Whether a reveal was prepended to the batch
    pub revealed: bool,
    /// Counters consumed, in order
    pub counters: Vec<u64>,
}

/// Sends manager operations with per-source in-flight discipline.
pub struct OperationSender {
    chain: Arc<dyn ChainClient>,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    counters: Mutex<HashMap<String, u64>>,
}

impl OperationSender {
    /// Create a sender over `chain`.
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self {
            chain,
            locks: Mutex::new(HashMap::new()),
            counters: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, source: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            locks
                .entry(source.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    fn cached_counter(&self, source: &str) -> Option<u64> {
        self.counters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(source)
            .copied()
    }

    fn store_counter(&self, source: &str, counter: u64) {
        self.counters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(source.to_string(), counter);
    }

    /// Drop the cached counter for `source`, forcing a refetch next send.
    pub fn invalidate_counter(&self, source: &str) {
        self.counters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(source);
    }

    /// Send `contents` from the delegate's account.
    ///
    /// The pipeline: acquire the source lock → resolve the counter →
    /// prepend a reveal when the manager key is unrevealed → forge locally →
    /// verify against the remote forge → sign under the generic watermark →
    /// preapply → inject. Counter placeholders in `contents` are overwritten
    /// with the strictly increasing sequence.
    ///
    /// # Errors
    ///
    /// Any stage failing aborts the send; a counter-shaped rejection also
    /// invalidates the cached counter for this source.
    pub async fn send_manager_operation(
        &self,
        keys: &KeyPair,
        mut contents: Vec<OperationContent>,
        options: &OperationOptions,
    ) -> Result<SendOutcome, EngineError> {
        let source = keys.public_key_hash.clone();

        // serialize all sends from this source
        let lock = self.lock_for(&source);
        let _in_flight = lock.lock().await;

        let result = self
            .send_locked(keys, &source, &mut contents, options)
            .await;

        if let Err(ref error) = result {
            if is_counter_rejection(error) {
                warn!(
                    "[sender] Counter rejection for {}; invalidating cached counter",
                    source
                );
                self.invalidate_counter(&source);
            }
        }
        result
    }

    async fn send_locked(
        &self,
        keys: &KeyPair,
        source: &str,
        contents: &mut Vec<OperationContent>,
        options: &OperationOptions,
    ) -> Result<SendOutcome, EngineError> {
        let head = self.chain.head().await?;

        // counter: cache hit saves the refetch; the chain value is the last
        // used counter, the next operation takes value + 1
        let mut next_counter = match self.cached_counter(source) {
            Some(counter) => counter + 1,
            None => self.chain.counter(source).await? + 1,
        };

        // unrevealed accounts must reveal before any other manager operation
        let revealed = if self.chain.manager_key(source).await?.is_none() {
            contents.insert(
                0,
                OperationContent::Reveal {
                    meta: tzb_forge::ManagerMeta {
                        source: source.to_string(),
                        fee: options.fee(),
                        counter: 0,
                        gas_limit: options.manager_gas(),
                        storage_limit: options.manager_storage(),
                    },
                    public_key: keys.public_key.clone(),
                },
            );
            true
        } else {
            false
        };

        let counters = assign_counters(contents, &mut next_counter);

        let local = forge_operations(&head.hash, contents)?;

        if options.verify_forge {
            let body = json!({
                "branch": head.hash,
                "contents": contents.iter().map(|c| c.to_json()).collect::<Vec<_>>(),
            });
            let remote = self.chain.forge_operations(&body).await?;
            if let Err(mismatch) = verify_against_remote(&local, &remote) {
                error!(
                    "[sender] Forge verification failed for {}: refusing to sign",
                    source
                );
                return Err(mismatch.into());
            }
        }

        let signed = keys.sign(&local, Watermark::Generic)?;

        let preapply_body = json!([{
            "protocol": head.protocol,
            "branch": head.hash,
            "contents": contents.iter().map(|c| c.to_json()).collect::<Vec<_>>(),
            "signature": signed.edsig,
        }]);
        self.chain.preapply_operations(&preapply_body).await?;

        let operation_hash = self.chain.inject_operation(&signed.signed_bytes).await?;

        // the burst consumed counters up to next_counter - 1
        self.store_counter(source, next_counter - 1);

        info!(
            "[sender] Injected {} ({} contents) from {}",
            operation_hash,
            contents.len(),
            source
        );

        Ok(SendOutcome {
            operation_hash,
            revealed,
            counters,
        })
    }

    /// Poll until `operation_hash` appears in a block, bounded by
    /// `max_attempts`.
    ///
    /// # Errors
    ///
    /// `InclusionTimeout` when the budget is exhausted; RPC errors count as
    /// failed polls rather than aborting the wait.
    pub async fn await_inclusion(
        &self,
        operation_hash: &str,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Result<i32, EngineError> {
        for attempt in 1..=max_attempts {
            match self.check_included(operation_hash).await {
                Ok(Some(level)) => {
                    info!(
                        "[sender] {} included at level {} after {} polls",
                        operation_hash, level, attempt
                    );
                    return Ok(level);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!("[sender] Inclusion poll failed: {}", error);
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
        Err(EngineError::InclusionTimeout {
            operation_hash: operation_hash.to_string(),
            attempts: max_attempts,
        })
    }

    async fn check_included(&self, operation_hash: &str) -> Result<Option<i32>, EngineError> {
        let head = self.chain.head().await?;
        let hashes = self.chain.operation_hashes(&head.hash).await?;
        if hashes.iter().flatten().any(|h| h == operation_hash) {
            return Ok(Some(head.level()));
        }
        Ok(None)
    }
}

/// Overwrite manager counters with a strictly increasing sequence starting
/// at `next`; returns the counters consumed.
fn assign_counters(contents: &mut [OperationContent], next: &mut u64) -> Vec<u64> {
    let mut consumed = Vec::new();
    for content in contents.iter_mut() {
        let meta = match content {
            OperationContent::Reveal { meta, .. }
            | OperationContent::Transaction { meta, .. }
            | OperationContent::Origination { meta, .. }
            | OperationContent::Delegation { meta, .. } => meta,
            _ => continue,
        };
        meta.counter = *next;
        consumed.push(*next);
        *next += 1;
    }
    consumed
}

fn is_counter_rejection(error: &EngineError) -> bool {
    match error {
        EngineError::Rpc(RpcError::Protocol(message)) => message.contains("counter"),
        _ => false,
    }
}
