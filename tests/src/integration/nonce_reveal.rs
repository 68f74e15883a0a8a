//! Nonce reveal scenarios: reveal inside the cycle window, confirmation via
//! inclusion, and the drop path once the window has passed.

use crate::mock_chain::{block, test_constants, MockChain};
use crate::mock_store::MemoryStore;
use shared_crypto::KeyPair;
use shared_types::SeedNonce;
use std::sync::Arc;
use tzb_engine::{ChainClient, NonceRevealer};
use tzb_rpc::ConstantsCell;

fn keys() -> KeyPair {
    KeyPair::from_seed(&[3u8; 32]).unwrap()
}

fn nonce_at(level: i32) -> SeedNonce {
    SeedNonce {
        hash: "Bcommit".into(),
        seed_nonce_hash: "nce-test".into(),
        seed: "ab".repeat(32),
        level,
        revealed: false,
    }
}

fn setup() -> (Arc<MockChain>, Arc<MemoryStore>, NonceRevealer) {
    let chain = Arc::new(MockChain::new());
    let store = Arc::new(MemoryStore::new());
    let constants = Arc::new(ConstantsCell::new());
    constants.set(test_constants());
    let revealer = NonceRevealer::new(chain.clone(), constants, store.clone());
    (chain, store, revealer)
}

#[tokio::test]
async fn test_reveals_inside_window_and_confirms() {
    let (chain, store, revealer) = setup();
    let keys = keys();

    // committed at 4100, window is [4096, 8192)
    revealer.add(nonce_at(4100)).await;
    chain.set_head(block("Bhead", 4200, None));

    revealer
        .tick(&keys, &chain.head().await.unwrap())
        .await
        .unwrap();
    assert_eq!(chain.injected_operations.lock().unwrap().len(), 1);

    // the mock includes injected operations; the next tick confirms
    revealer
        .tick(&keys, &chain.head().await.unwrap())
        .await
        .unwrap();
    let persisted = store.nonces.lock().unwrap().clone();
    assert_eq!(persisted.len(), 1);
    assert!(persisted[0].revealed);

    // no re-injection once revealed
    revealer
        .tick(&keys, &chain.head().await.unwrap())
        .await
        .unwrap();
    assert_eq!(chain.injected_operations.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_past_window_drops_without_revealing() {
    let (chain, store, revealer) = setup();
    let keys = keys();

    revealer.add(nonce_at(4100)).await;
    // head is already in the next cycle: the window [4096, 8192) has passed
    chain.set_head(block("Bhead", 8192, None));

    revealer
        .tick(&keys, &chain.head().await.unwrap())
        .await
        .unwrap();

    assert!(chain.injected_operations.lock().unwrap().is_empty());
    assert!(store.nonces.lock().unwrap().is_empty());
    assert_eq!(revealer.unrevealed().await, 0);
}

#[tokio::test]
async fn test_restores_persisted_nonces_on_load() {
    let (chain, store, revealer) = setup();
    store
        .nonces
        .lock()
        .unwrap()
        .push(nonce_at(4100));

    revealer.load().await;
    assert_eq!(revealer.unrevealed().await, 1);

    // and they are revealed like freshly added ones
    chain.set_head(block("Bhead", 4200, None));
    revealer
        .tick(&keys(), &chain.head().await.unwrap())
        .await
        .unwrap();
    assert_eq!(chain.injected_operations.lock().unwrap().len(), 1);
}
