//! Baking engine scenarios: no-rights marking, mine-then-inject, and
//! supersession by a foreign block.

use crate::mock_chain::{block, test_constants, MockChain};
use chrono::{Duration, Utc};
use shared_crypto::{blake2b_256, KeyPair};
use shared_types::BakingRight;
use std::sync::Arc;
use tzb_engine::{BakingEngine, ChainClient};
use tzb_rpc::ConstantsCell;

fn keys() -> KeyPair {
    KeyPair::from_seed(&[1u8; 32]).unwrap()
}

fn setup(head_level: i32) -> (Arc<MockChain>, BakingEngine, KeyPair) {
    let chain = Arc::new(MockChain::new());
    chain.set_head(block("Bhead", head_level, None));
    let constants = Arc::new(ConstantsCell::new());
    constants.set(test_constants());
    let engine = BakingEngine::new(chain.clone(), constants);
    (chain, engine, keys())
}

fn right(delegate: &str, level: i32, seconds_ago: i64) -> BakingRight {
    BakingRight {
        level,
        delegate: delegate.into(),
        priority: 0,
        estimated_time: Some(Utc::now() - Duration::seconds(seconds_ago)),
    }
}

#[tokio::test]
async fn test_no_rights_marks_level_without_injecting() {
    let (chain, engine, keys) = setup(100);

    engine.tick(&keys, &chain.head().await.unwrap()).await.unwrap();
    engine.tick(&keys, &chain.head().await.unwrap()).await.unwrap();

    assert!(chain.injected_blocks.lock().unwrap().is_empty());
    // the level was decided on the first tick; the second skips the query
    assert_eq!(
        chain
            .baking_rights_fetches
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn test_due_right_mines_then_injects_on_next_tick() {
    let (chain, engine, keys) = setup(100);
    chain
        .baking_rights
        .lock()
        .unwrap()
        .push(right(&keys.public_key_hash, 101, 10));

    let head = chain.head().await.unwrap();

    // tick 1: mine + sign + queue
    engine.tick(&keys, &head).await.unwrap();
    assert_eq!(engine.pending_levels(), vec![101]);
    assert!(chain.injected_blocks.lock().unwrap().is_empty());

    // tick 2, head unchanged: the pending block's timestamp has arrived
    engine.tick(&keys, &head).await.unwrap();
    let injected = chain.injected_blocks.lock().unwrap();
    assert_eq!(injected.len(), 1);
    assert!(engine.pending_levels().is_empty());

    // the injection body carries signed data and the four passes
    let data = injected[0]["data"].as_str().unwrap();
    assert!(!data.is_empty());
    assert_eq!(injected[0]["operations"].as_array().unwrap().len(), 4);

    // block watermark: signature verifies over 0x01 ‖ header bytes
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};
    let bytes = hex::decode(data).unwrap();
    let (header, signature) = bytes.split_at(bytes.len() - 64);
    let mut tagged = vec![0x01];
    tagged.extend_from_slice(header);
    let digest = blake2b_256(&tagged);
    let key = VerifyingKey::from_bytes(&keys.public_key_bytes()).unwrap();
    let mut raw = [0u8; 64];
    raw.copy_from_slice(signature);
    assert!(key.verify(&digest, &Signature::from_bytes(&raw)).is_ok());
}

#[tokio::test]
async fn test_commitment_level_hands_nonce_to_caller() {
    // next level 4128 = 129 * 32 is a commitment level
    let (chain, engine, keys) = setup(4127);
    chain
        .baking_rights
        .lock()
        .unwrap()
        .push(right(&keys.public_key_hash, 4128, 10));

    let head = chain.head().await.unwrap();
    let first = engine.tick(&keys, &head).await.unwrap();
    assert!(first.is_empty());

    let second = engine.tick(&keys, &head).await.unwrap();
    assert_eq!(second.len(), 1);
    let nonce = &second[0];
    assert_eq!(nonce.level, 4128);
    assert!(!nonce.revealed);
    assert_eq!(nonce.seed.len(), 64);
    assert!(nonce.seed_nonce_hash.starts_with("nce"));
}

#[tokio::test]
async fn test_pending_block_superseded_by_foreign_block() {
    let (chain, engine, keys) = setup(100);
    chain
        .baking_rights
        .lock()
        .unwrap()
        .push(right(&keys.public_key_hash, 101, 10));

    let head = chain.head().await.unwrap();
    engine.tick(&keys, &head).await.unwrap();
    assert_eq!(engine.pending_levels(), vec![101]);

    // someone else baked 101 first
    chain.set_head(block("Bforeign", 101, Some("tz1SomeoneElse")));
    engine
        .tick(&keys, &chain.head().await.unwrap())
        .await
        .unwrap();

    assert!(chain.injected_blocks.lock().unwrap().is_empty());
    assert!(engine.pending_levels().is_empty());
}
