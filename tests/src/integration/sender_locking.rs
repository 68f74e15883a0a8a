//! Operation sender scenarios: per-source serialization, counter caching
//! and invalidation, reveal prepending, fail-safe forge verification.

use crate::mock_chain::{block, MockChain};
use shared_codec::base58::{b58check_encode, Prefix};
use shared_crypto::KeyPair;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tzb_engine::{EngineError, OperationSender};
use tzb_forge::{FeeTier, ManagerMeta, OperationContent, OperationOptions};

fn keys() -> KeyPair {
    KeyPair::from_seed(&[4u8; 32]).unwrap()
}

fn destination() -> String {
    b58check_encode(Prefix::Tz1, &[0x99u8; 20]).unwrap()
}

fn transfer(source: &str, amount: u64) -> OperationContent {
    OperationContent::Transaction {
        meta: ManagerMeta {
            source: source.into(),
            fee: FeeTier::Low.mutez(),
            counter: 0,
            gas_limit: 10_600,
            storage_limit: 300,
        },
        amount,
        destination: destination(),
    }
}

fn setup() -> (Arc<MockChain>, Arc<OperationSender>, KeyPair) {
    let chain = Arc::new(MockChain::new());
    chain.set_head(block("Bhead", 100, None));
    chain.counter_value.store(10, Ordering::SeqCst);
    let sender = Arc::new(OperationSender::new(chain.clone()));
    (chain, sender, keys())
}

#[tokio::test]
async fn test_concurrent_sends_from_one_source_never_interleave() {
    let (chain, sender, keys) = setup();
    // widen the race window: injection takes a while
    *chain.inject_delay.lock().unwrap() = Some(Duration::from_millis(50));

    let source = keys.public_key_hash.clone();
    let options = OperationOptions::default();
    let (first, second) = tokio::join!(
        sender.send_manager_operation(&keys, vec![transfer(&source, 1)], &options),
        sender.send_manager_operation(&keys, vec![transfer(&source, 2)], &options),
    );

    let first = first.unwrap();
    let second = second.unwrap();

    // both went out, with distinct strictly increasing counters
    assert_eq!(chain.injected_operations.lock().unwrap().len(), 2);
    let mut counters: Vec<u64> = first
        .counters
        .iter()
        .chain(second.counters.iter())
        .copied()
        .collect();
    counters.sort_unstable();
    assert_eq!(counters, vec![11, 12]);

    // the second send reused the cached counter: one on-chain fetch total
    assert_eq!(chain.counter_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unrevealed_account_gets_reveal_prepended() {
    let (chain, sender, keys) = setup();
    chain.manager_key_revealed.store(false, Ordering::SeqCst);

    let source = keys.public_key_hash.clone();
    let outcome = sender
        .send_manager_operation(
            &keys,
            vec![transfer(&source, 5)],
            &OperationOptions::default(),
        )
        .await
        .unwrap();

    assert!(outcome.revealed);
    // reveal consumed 11, the transfer 12
    assert_eq!(outcome.counters, vec![11, 12]);
}

#[tokio::test]
async fn test_forge_mismatch_never_signs() {
    let (chain, sender, keys) = setup();
    chain.lying_forge.store(true, Ordering::SeqCst);

    let source = keys.public_key_hash.clone();
    let result = sender
        .send_manager_operation(
            &keys,
            vec![transfer(&source, 5)],
            &OperationOptions::default(),
        )
        .await;

    assert!(matches!(
        result,
        Err(EngineError::Forge(
            tzb_forge::ForgeError::VerificationMismatch { .. }
        ))
    ));
    assert!(chain.injected_operations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_verification_can_be_disabled_per_call() {
    let (chain, sender, keys) = setup();
    chain.lying_forge.store(true, Ordering::SeqCst);

    let source = keys.public_key_hash.clone();
    let options = OperationOptions {
        verify_forge: false,
        ..Default::default()
    };
    let outcome = sender
        .send_manager_operation(&keys, vec![transfer(&source, 5)], &options)
        .await
        .unwrap();

    assert!(!outcome.operation_hash.is_empty());
    assert_eq!(chain.injected_operations.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_await_inclusion_finds_injected_operation() {
    let (chain, sender, keys) = setup();

    let source = keys.public_key_hash.clone();
    let outcome = sender
        .send_manager_operation(
            &keys,
            vec![transfer(&source, 5)],
            &OperationOptions::default(),
        )
        .await
        .unwrap();

    let level = sender
        .await_inclusion(&outcome.operation_hash, Duration::from_millis(10), 3)
        .await
        .unwrap();
    assert_eq!(level, 100);
}

#[tokio::test]
async fn test_await_inclusion_times_out() {
    let (_chain, sender, _keys) = setup();

    let result = sender
        .await_inclusion("opNeverInjected", Duration::from_millis(5), 3)
        .await;

    assert!(matches!(
        result,
        Err(EngineError::InclusionTimeout { attempts: 3, .. })
    ));
}
