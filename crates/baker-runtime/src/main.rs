//! # Tezos Baker Runtime
//!
//! The daemon entry point. Wires the service graph once at startup and
//! passes handles down, with no global singletons:
//!
//! ```text
//! NodeClient ──┐
//!              ├─→ OperationSender ─→ RewardDistributor
//! ConstantsCell┤
//!              └─→ BakerController ─→ {Baking, Endorsing, Nonces, Accuser}
//! JsonFileStore ──→ (nonces, reward records, keys)
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Install the tracing subscriber
//! 2. Load settings (JSON file + env overrides)
//! 3. Open the file store and resolve the delegate's keys
//! 4. Start the controller tick loop and the reward loop
//! 5. Wait for ctrl-c, then stop both gracefully

mod config;
mod store;

use anyhow::{bail, Context, Result};
use shared_crypto::KeyPair;
use shared_types::{BakerKeys, BakerStore, TracingAlertSink};
use std::path::PathBuf;
use std::sync::Arc;
use store::JsonFileStore;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use tzb_engine::{BakerController, ChainClient, EngineFlags, OperationSender};
use tzb_rewards::RewardDistributor;
use tzb_rpc::{ConstantsCell, IndexerClient, NodeClient};

/// Resolve the delegate's keys from the store or the environment.
///
/// Precedence: `BAKER_SECRET_KEY` (an `edsk...`, persisted for next runs),
/// then stored keys (decrypted with `BAKER_PASSPHRASE` when sealed).
async fn resolve_keys(store: &JsonFileStore) -> Result<KeyPair> {
    if let Ok(secret) = std::env::var("BAKER_SECRET_KEY") {
        let pair = KeyPair::from_secret_key(&secret).context("BAKER_SECRET_KEY is not usable")?;
        store
            .set_baker_keys(BakerKeys {
                secret_key: pair.secret_key.clone(),
                public_key: pair.public_key.clone(),
                public_key_hash: pair.public_key_hash.clone(),
                encrypted: false,
            })
            .await
            .ok();
        return Ok(pair);
    }

    let user = store.get_user_data().await.context("reading stored keys")?;
    let Some(keys) = user.keys else {
        bail!("no keys: set BAKER_SECRET_KEY or store keys first");
    };

    if keys.encrypted {
        let passphrase = std::env::var("BAKER_PASSPHRASE")
            .context("stored key is encrypted; set BAKER_PASSPHRASE")?;
        KeyPair::from_encrypted(&keys.secret_key, &passphrase)
            .context("decrypting stored secret key")
    } else {
        KeyPair::from_secret_key(&keys.secret_key).context("stored secret key is not usable")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  Tezos Baker Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let settings_path = std::env::var("BAKER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("baker.json"));
    let settings = config::load_settings(&settings_path)?;
    info!("Node:    {}", settings.node_url);
    info!("Indexer: {}", settings.indexer_url);

    let data_path = std::env::var("BAKER_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("baker-data.json"));
    let store = Arc::new(JsonFileStore::new(&data_path));

    let keys = resolve_keys(&store).await?;
    info!("Delegate: {}", keys.public_key_hash);

    // service graph
    let node = NodeClient::new(&settings.node_url).context("building node client")?;
    let indexer = IndexerClient::new(&settings.indexer_url).context("building indexer client")?;
    let chain: Arc<dyn ChainClient> = Arc::new(node);
    let constants = Arc::new(ConstantsCell::new());
    let flags = Arc::new(EngineFlags::from_settings(&settings));
    let sink = Arc::new(TracingAlertSink);
    let sender = Arc::new(OperationSender::new(Arc::clone(&chain)));

    let controller = Arc::new(BakerController::new(
        Arc::clone(&chain),
        Arc::clone(&constants),
        store.clone() as Arc<dyn BakerStore>,
        sink,
        Arc::clone(&flags),
    ));

    let rewards = Arc::new(RewardDistributor::new(
        Arc::clone(&chain),
        Arc::new(indexer),
        sender,
        store.clone() as Arc<dyn BakerStore>,
        Arc::clone(&constants),
        Arc::clone(&flags),
        settings.operator_fee_percent,
        settings.reward_batch_size,
    ));

    let reward_keys = Arc::new(keys.clone());
    Arc::clone(&controller).start(keys).await;
    Arc::clone(&rewards).start(reward_keys).await;

    info!("Baker is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    rewards.stop().await;
    controller.stop().await;
    info!("Shutdown complete");

    Ok(())
}
