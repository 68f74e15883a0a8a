//! Reward distributor scenarios: batching, netting, idempotent re-runs and
//! the payable-cycle watermark.

use crate::mock_chain::{block, test_constants, MockChain};
use crate::mock_store::MemoryStore;
use async_trait::async_trait;
use shared_crypto::KeyPair;
use std::sync::Arc;
use tzb_engine::{EngineFlags, OperationSender};
use tzb_rewards::{RewardDistributor, RewardSource};
use tzb_rpc::{ConstantsCell, DelegatorShare, RpcError};

struct FixedShares(Vec<(String, u64)>);

#[async_trait]
impl RewardSource for FixedShares {
    async fn rewards_report(
        &self,
        _delegate: &str,
        _cycle: i32,
    ) -> Result<Vec<DelegatorShare>, RpcError> {
        Ok(self
            .0
            .iter()
            .map(|(address, amount)| DelegatorShare {
                address: address.clone(),
                amount: *amount,
            })
            .collect())
    }
}

fn keys() -> KeyPair {
    KeyPair::from_seed(&[5u8; 32]).unwrap()
}

fn delegator(fill: u8) -> String {
    shared_codec::base58::b58check_encode(shared_codec::Prefix::Tz1, &[fill; 20]).unwrap()
}

fn setup(
    shares: Vec<(String, u64)>,
    batch_size: usize,
) -> (Arc<MockChain>, Arc<MemoryStore>, RewardDistributor, KeyPair) {
    let chain = Arc::new(MockChain::new());
    chain.set_head(block("Bhead", 100, None));
    chain.counter_value.store(0, std::sync::atomic::Ordering::SeqCst);

    let store = Arc::new(MemoryStore::new());
    let constants = Arc::new(ConstantsCell::new());
    constants.set(test_constants());
    let sender = Arc::new(OperationSender::new(chain.clone()));
    let flags = Arc::new(EngineFlags::default());

    let distributor = RewardDistributor::new(
        chain.clone(),
        Arc::new(FixedShares(shares)),
        sender,
        store.clone(),
        constants,
        flags,
        10.0,
        batch_size,
    );
    (chain, store, distributor, keys())
}

#[tokio::test]
async fn test_distributes_in_batches_and_records_paid_state() {
    let shares = vec![
        (delegator(0xA1), 1_000_000),
        (delegator(0xA2), 2_000_000),
        (delegator(0xA3), 3_000_000),
    ];
    let (chain, store, distributor, keys) = setup(shares, 2);

    distributor.distribute_cycle(&keys, 5).await.unwrap();

    // 3 payouts in batches of 2 → two operations
    assert_eq!(chain.injected_operations.lock().unwrap().len(), 2);

    let sent = store.sent_rewards.lock().unwrap().get(&5).cloned().unwrap();
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|r| r.applied));
    assert!(sent.iter().all(|r| r.operation_hash.is_some()));
    assert_eq!(*store.last_rewarded_cycle.lock().unwrap(), Some(5));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let shares = vec![
        (delegator(0xB1), 1_000_000),
        (delegator(0xB2), 2_000_000),
    ];
    let (chain, store, distributor, keys) = setup(shares, 25);

    distributor.distribute_cycle(&keys, 7).await.unwrap();
    let after_first = chain.injected_operations.lock().unwrap().len();
    assert_eq!(after_first, 1);

    // identical re-run: every delegator is already recorded as paid
    distributor.distribute_cycle(&keys, 7).await.unwrap();
    assert_eq!(chain.injected_operations.lock().unwrap().len(), after_first);
    assert_eq!(
        store.sent_rewards.lock().unwrap().get(&7).unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_dust_shares_and_self_are_excluded() {
    let keys = keys();
    let shares = vec![
        // nets to zero after the 10% fee and the flat 1420 deduction
        (delegator(0xC1), 1_500),
        // the delegate's own address never pays itself
        (keys.public_key_hash.clone(), 5_000_000),
    ];
    let (chain, store, distributor, _) = setup(shares, 25);

    distributor.distribute_cycle(&keys, 9).await.unwrap();

    assert!(chain.injected_operations.lock().unwrap().is_empty());
    assert!(store
        .sent_rewards
        .lock()
        .unwrap()
        .get(&9)
        .map(|s| s.is_empty())
        .unwrap_or(true));
    // an empty cycle still advances the watermark
    assert_eq!(*store.last_rewarded_cycle.lock().unwrap(), Some(9));
}

#[tokio::test]
async fn test_check_cycles_honors_preserved_cycles_window() {
    // head at cycle 7 (level 7 * 4096), preserved_cycles 5 → payable = 1
    let (chain, store, distributor, keys) = setup(vec![], 25);
    chain.set_head(block("Bhigh", 7 * 4096, None));

    distributor.check_cycles(&keys).await.unwrap();

    // cycles 0 and 1 were both (emptily) distributed
    assert_eq!(*store.last_rewarded_cycle.lock().unwrap(), Some(1));
    assert!(chain.injected_operations.lock().unwrap().is_empty());
}
