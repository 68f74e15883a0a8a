//! # Reward Distributor
//!
//! Pays each delegator its share of a cycle's rewards, minus the operator
//! fee and a flat minimum transaction fee. Paid state is persisted per cycle
//! so a crash or an indexer lag never produces a double payment, and a
//! running `last_rewarded_cycle` watermark gates which cycles are even
//! considered. Batches go out serially through the operation sender and wait
//! for on-chain inclusion before the next batch, trading latency for never
//! double-spending a counter.

#![warn(missing_docs)]
#![warn(clippy::all)]

use shared_crypto::KeyPair;
use shared_types::{BakerStore, SentReward};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tzb_engine::{ChainClient, EngineFlags, OperationSender};
use tzb_forge::{FeeTier, ManagerMeta, OperationContent, OperationOptions};
use tzb_rpc::{ConstantsCell, DelegatorShare, IndexerClient, RpcError};

/// How often the loop checks for a newly payable cycle.
const CHECK_INTERVAL: Duration = Duration::from_secs(60);
/// Inclusion polling cadence for a sent batch.
const INCLUSION_POLL: Duration = Duration::from_secs(10);
/// Inclusion polling budget per batch.
const INCLUSION_ATTEMPTS: u32 = 30;
/// Flat fee deducted from each payout to cover its transaction.
const MIN_TX_FEE_MUTEZ: u64 = 1_420;

/// Errors from the distribution pipeline.
#[derive(Debug, Error)]
pub enum RewardError {
    /// Indexer or node call failed
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Sending a batch failed
    #[error(transparent)]
    Engine(#[from] tzb_engine::EngineError),

    /// Persistence failed; distribution stops rather than risk double pay
    #[error(transparent)]
    Storage(#[from] shared_types::StorageError),
}

/// Source of per-cycle delegator shares.
///
/// The production implementation is the indexer client; tests script their
/// own.
#[async_trait::async_trait]
pub trait RewardSource: Send + Sync {
    /// Gross shares for `delegate` at `cycle`.
    async fn rewards_report(
        &self,
        delegate: &str,
        cycle: i32,
    ) -> Result<Vec<DelegatorShare>, RpcError>;
}

#[async_trait::async_trait]
impl RewardSource for IndexerClient {
    async fn rewards_report(
        &self,
        delegate: &str,
        cycle: i32,
    ) -> Result<Vec<DelegatorShare>, RpcError> {
        IndexerClient::rewards_report(self, delegate, cycle).await
    }
}

/// The per-cycle payout pipeline and its scheduling loop.
pub struct RewardDistributor {
    chain: Arc<dyn ChainClient>,
    source: Arc<dyn RewardSource>,
    sender: Arc<OperationSender>,
    store: Arc<dyn BakerStore>,
    constants: Arc<ConstantsCell>,
    flags: Arc<EngineFlags>,
    /// Operator fee retained, percent
    operator_fee_percent: f64,
    /// Payouts per transaction batch
    batch_size: usize,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RewardDistributor {
    /// Wire the distributor.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain: Arc<dyn ChainClient>,
        source: Arc<dyn RewardSource>,
        sender: Arc<OperationSender>,
        store: Arc<dyn BakerStore>,
        constants: Arc<ConstantsCell>,
        flags: Arc<EngineFlags>,
        operator_fee_percent: f64,
        batch_size: usize,
    ) -> Self {
        Self {
            chain,
            source,
            sender,
            store,
            constants,
            flags,
            operator_fee_percent,
            batch_size: batch_size.max(1),
            shutdown: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// Start the once-a-minute payable-cycle check. Idempotent.
    pub async fn start(self: Arc<Self>, keys: Arc<KeyPair>) {
        self.stop().await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let distributor = Arc::clone(&self);

        let handle = tokio::spawn(async move {
            let mut shutdown = shutdown_rx;
            let mut interval = tokio::time::interval(CHECK_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if *shutdown.borrow() {
                            break;
                        }
                        if !distributor.flags.rewarding() {
                            continue;
                        }
                        if let Err(e) = distributor.check_cycles(&keys).await {
                            warn!("[rewards] Cycle check failed: {}", e);
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
            info!("[rewards] Reward loop stopped");
        });

        *self.shutdown.lock().unwrap_or_else(|e| e.into_inner()) = Some(shutdown_tx);
        *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    /// Stop the loop. Safe to call when not running.
    pub async fn stop(&self) {
        let shutdown = self
            .shutdown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(shutdown) = shutdown {
            let _ = shutdown.send(true);
        }
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Distribute every payable cycle the watermark has not covered yet.
    pub async fn check_cycles(&self, keys: &KeyPair) -> Result<(), RewardError> {
        let constants = self.constants.get();
        let head = self.chain.head().await?;
        let current_cycle = head
            .cycle()
            .unwrap_or_else(|| constants.cycle_of(head.level()));

        // rewards for a cycle unlock preserved_cycles + 1 cycles later
        let payable = current_cycle - (constants.preserved_cycles + 1);
        if payable < 0 {
            return Ok(());
        }

        let last = self.store.get_last_rewarded_cycle().await?.unwrap_or(-1);
        for cycle in (last + 1)..=payable {
            self.distribute_cycle(keys, cycle).await?;
        }
        Ok(())
    }

    /// Pay out one cycle. Idempotent: already-recorded payouts are skipped,
    /// and the watermark only advances when everything applied.
    pub async fn distribute_cycle(&self, keys: &KeyPair, cycle: i32) -> Result<(), RewardError> {
        let delegate = keys.public_key_hash.clone();
        let shares = self.source.rewards_report(&delegate, cycle).await?;

        let mut sent = self.store.get_sent_rewards_by_cycle(cycle).await?;
        let paid: Vec<String> = sent
            .iter()
            .filter(|r| r.applied)
            .map(|r| r.destination.clone())
            .collect();

        let payable: Vec<(String, u64)> = shares
            .iter()
            .filter(|s| s.address != delegate)
            .filter(|s| !paid.contains(&s.address))
            .filter_map(|s| {
                let net = net_amount(s.amount, self.operator_fee_percent);
                net.map(|amount| (s.address.clone(), amount))
            })
            .collect();

        if payable.is_empty() {
            info!("[rewards] Cycle {}: nothing to pay", cycle);
            self.store.set_last_rewarded_cycle(cycle).await?;
            return Ok(());
        }

        info!(
            "[rewards] Cycle {}: paying {} delegator(s) in batches of {}",
            cycle,
            payable.len(),
            self.batch_size
        );

        let mut all_applied = true;
        for batch in payable.chunks(self.batch_size) {
            let applied = self.send_batch(keys, cycle, batch, &mut sent).await;
            all_applied &= applied;
            // partial progress must survive a crash
            self.store
                .set_sent_rewards_by_cycle(cycle, sent.clone())
                .await?;
        }

        if all_applied {
            self.store.set_last_rewarded_cycle(cycle).await?;
            info!("[rewards] Cycle {} fully distributed", cycle);
        } else {
            warn!(
                "[rewards] Cycle {} has failed payouts; watermark not advanced",
                cycle
            );
        }
        Ok(())
    }

    /// Send one batch and wait for inclusion. Records per-destination
    /// outcomes into `sent`; returns whether the whole batch applied.
    async fn send_batch(
        &self,
        keys: &KeyPair,
        cycle: i32,
        batch: &[(String, u64)],
        sent: &mut Vec<SentReward>,
    ) -> bool {
        let contents: Vec<OperationContent> = batch
            .iter()
            .map(|(destination, amount)| OperationContent::Transaction {
                meta: ManagerMeta {
                    source: keys.public_key_hash.clone(),
                    fee: FeeTier::Low.mutez(),
                    counter: 0,
                    gas_limit: tzb_forge::fees::GAS_LIMIT_TRANSACTION,
                    storage_limit: tzb_forge::fees::STORAGE_LIMIT_TRANSACTION,
                },
                amount: *amount,
                destination: destination.clone(),
            })
            .collect();

        let options = OperationOptions {
            tier: FeeTier::Low,
            ..Default::default()
        };

        let outcome = match self
            .sender
            .send_manager_operation(keys, contents, &options)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("[rewards] Batch send failed for cycle {}: {}", cycle, e);
                for (destination, amount) in batch {
                    sent.push(SentReward {
                        destination: destination.clone(),
                        amount: *amount,
                        operation_hash: None,
                        applied: false,
                    });
                }
                return false;
            }
        };

        // wait for the batch to land before the next one touches the counter
        let applied = match self
            .sender
            .await_inclusion(&outcome.operation_hash, INCLUSION_POLL, INCLUSION_ATTEMPTS)
            .await
        {
            Ok(level) => {
                info!(
                    "[rewards] Batch {} included at level {}",
                    outcome.operation_hash, level
                );
                true
            }
            Err(e) => {
                error!("[rewards] Batch {} not confirmed: {}", outcome.operation_hash, e);
                false
            }
        };

        for (destination, amount) in batch {
            sent.push(SentReward {
                destination: destination.clone(),
                amount: *amount,
                operation_hash: Some(outcome.operation_hash.clone()),
                applied,
            });
        }
        applied
    }
}

/// Net payout: gross share minus the operator percentage and the flat
/// transaction fee. `None` when nothing would remain.
fn net_amount(gross: u64, operator_fee_percent: f64) -> Option<u64> {
    let fee = (gross as f64 * operator_fee_percent / 100.0).floor() as u64;
    let after_fee = gross.saturating_sub(fee);
    let net = after_fee.saturating_sub(MIN_TX_FEE_MUTEZ);
    (net > 0).then_some(net)
}
