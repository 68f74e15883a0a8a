//! Endorsing engine scenarios: single-shot per level, watermark domain,
//! no retry after an attempt.

use crate::mock_chain::{block, MockChain};
use shared_crypto::{blake2b_256, KeyPair};
use shared_types::EndorsingRight;
use std::sync::Arc;
use tzb_engine::{ChainClient, EndorsingEngine};

fn keys() -> KeyPair {
    KeyPair::from_seed(&[2u8; 32]).unwrap()
}

#[tokio::test]
async fn test_endorses_once_per_level() {
    let chain = Arc::new(MockChain::new());
    chain.set_head(block("Bhead", 100, None));
    let keys = keys();
    chain.endorsing_rights.lock().unwrap().push(EndorsingRight {
        level: 100,
        delegate: keys.public_key_hash.clone(),
        slots: vec![3, 17],
        estimated_time: None,
    });

    let engine = EndorsingEngine::new(chain.clone());
    let head = chain.head().await.unwrap();

    engine.tick(&keys, &head).await.unwrap();
    assert_eq!(chain.injected_operations.lock().unwrap().len(), 1);
    assert!(engine.attempted(100));

    // same head again: no second endorsement, no second rights query
    engine.tick(&keys, &head).await.unwrap();
    assert_eq!(chain.injected_operations.lock().unwrap().len(), 1);
    assert_eq!(
        chain
            .endorsing_rights_fetches
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn test_endorsement_signed_under_endorsement_watermark() {
    let chain = Arc::new(MockChain::new());
    chain.set_head(block("Bhead", 42, None));
    let keys = keys();
    chain.endorsing_rights.lock().unwrap().push(EndorsingRight {
        level: 42,
        delegate: keys.public_key_hash.clone(),
        slots: vec![1],
        estimated_time: None,
    });

    let engine = EndorsingEngine::new(chain.clone());
    engine
        .tick(&keys, &chain.head().await.unwrap())
        .await
        .unwrap();

    use ed25519_dalek::{Signature, Verifier, VerifyingKey};
    let injected = chain.injected_operations.lock().unwrap();
    let bytes = hex::decode(&injected[0]).unwrap();
    let (payload, signature) = bytes.split_at(bytes.len() - 64);

    let mut tagged = vec![0x02];
    tagged.extend_from_slice(payload);
    let digest = blake2b_256(&tagged);
    let key = VerifyingKey::from_bytes(&keys.public_key_bytes()).unwrap();
    let mut raw = [0u8; 64];
    raw.copy_from_slice(signature);
    assert!(key.verify(&digest, &Signature::from_bytes(&raw)).is_ok());
}

#[tokio::test]
async fn test_no_slots_marks_level_attempted() {
    let chain = Arc::new(MockChain::new());
    chain.set_head(block("Bhead", 100, None));
    let keys = keys();

    let engine = EndorsingEngine::new(chain.clone());
    engine
        .tick(&keys, &chain.head().await.unwrap())
        .await
        .unwrap();

    assert!(engine.attempted(100));
    assert!(chain.injected_operations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_lying_forge_aborts_before_signing() {
    let chain = Arc::new(MockChain::new());
    chain.set_head(block("Bhead", 100, None));
    chain
        .lying_forge
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let keys = keys();
    chain.endorsing_rights.lock().unwrap().push(EndorsingRight {
        level: 100,
        delegate: keys.public_key_hash.clone(),
        slots: vec![1],
        estimated_time: None,
    });

    let engine = EndorsingEngine::new(chain.clone());
    let result = engine.tick(&keys, &chain.head().await.unwrap()).await;

    assert!(result.is_err());
    assert!(chain.injected_operations.lock().unwrap().is_empty());
    // attempted stays marked: never risk a double endorsement
    assert!(engine.attempted(100));
}
