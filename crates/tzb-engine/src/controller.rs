//! Controller and scheduler.
//!
//! A fixed-interval tick drives head fetch → nonce reveals → baking →
//! endorsing → accusing, sequentially within one tick so the engines never
//! race on shared state. Engine flags toggle at runtime without restarting
//! the loop. `start` is idempotent; `stop` cancels future ticks but never
//! interrupts a tick already in flight.

use crate::accuser::Accuser;
use crate::baking::BakingEngine;
use crate::endorsing::EndorsingEngine;
use crate::nonces::NonceRevealer;
use crate::ports::ChainClient;
use shared_crypto::KeyPair;
use shared_types::{AlertSink, BakerSettings, BakerStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tzb_rpc::ConstantsCell;

/// Scheduler tick interval.
const TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Independently toggleable engine switches.
#[derive(Debug, Default)]
pub struct EngineFlags {
    baking: AtomicBool,
    endorsing: AtomicBool,
    accusing: AtomicBool,
    rewarding: AtomicBool,
}

impl EngineFlags {
    /// Initialize from settings.
    pub fn from_settings(settings: &BakerSettings) -> Self {
        let flags = Self::default();
        flags.baking.store(settings.baking, Ordering::SeqCst);
        flags.endorsing.store(settings.endorsing, Ordering::SeqCst);
        flags.accusing.store(settings.accusing, Ordering::SeqCst);
        flags.rewarding.store(settings.rewarding, Ordering::SeqCst);
        flags
    }

    /// Whether baking runs this tick.
    pub fn baking(&self) -> bool {
        self.baking.load(Ordering::SeqCst)
    }

    /// Whether endorsing runs this tick.
    pub fn endorsing(&self) -> bool {
        self.endorsing.load(Ordering::SeqCst)
    }

    /// Whether accusing runs this tick.
    pub fn accusing(&self) -> bool {
        self.accusing.load(Ordering::SeqCst)
    }

    /// Whether the reward loop may pay out.
    pub fn rewarding(&self) -> bool {
        self.rewarding.load(Ordering::SeqCst)
    }

    /// Toggle baking at runtime.
    pub fn set_baking(&self, enabled: bool) {
        self.baking.store(enabled, Ordering::SeqCst);
    }

    /// Toggle endorsing at runtime.
    pub fn set_endorsing(&self, enabled: bool) {
        self.endorsing.store(enabled, Ordering::SeqCst);
    }

    /// Toggle accusing at runtime.
    pub fn set_accusing(&self, enabled: bool) {
        self.accusing.store(enabled, Ordering::SeqCst);
    }

    /// Toggle rewarding at runtime.
    pub fn set_rewarding(&self, enabled: bool) {
        self.rewarding.store(enabled, Ordering::SeqCst);
    }
}

/// The baker's scheduler.
pub struct BakerController {
    chain: Arc<dyn ChainClient>,
    constants: Arc<ConstantsCell>,
    flags: Arc<EngineFlags>,
    baking: Arc<BakingEngine>,
    endorsing: Arc<EndorsingEngine>,
    revealer: Arc<NonceRevealer>,
    accuser: Arc<Accuser>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BakerController {
    /// Wire the controller and its engines.
    pub fn new(
        chain: Arc<dyn ChainClient>,
        constants: Arc<ConstantsCell>,
        store: Arc<dyn BakerStore>,
        sink: Arc<dyn AlertSink>,
        flags: Arc<EngineFlags>,
    ) -> Self {
        let baking = Arc::new(BakingEngine::new(Arc::clone(&chain), Arc::clone(&constants)));
        let endorsing = Arc::new(EndorsingEngine::new(Arc::clone(&chain)));
        let revealer = Arc::new(NonceRevealer::new(
            Arc::clone(&chain),
            Arc::clone(&constants),
            store,
        ));
        let accuser = Arc::new(Accuser::new(Arc::clone(&chain), sink));

        Self {
            chain,
            constants,
            flags,
            baking,
            endorsing,
            revealer,
            accuser,
            shutdown: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// The engine flags, for runtime toggling.
    pub fn flags(&self) -> Arc<EngineFlags> {
        Arc::clone(&self.flags)
    }

    /// Start ticking with `keys`. Always stops an existing loop first.
    pub async fn start(self: Arc<Self>, keys: KeyPair) {
        self.stop().await;

        info!("[controller] Starting baker for {}", keys.public_key_hash);

        // prime the constants cache; engines fall back to defaults until a
        // later start succeeds
        match self.chain.constants().await {
            Ok(constants) => self.constants.set(constants),
            Err(e) => warn!("[controller] Could not load network constants: {}", e),
        }

        self.revealer.load().await;

        let keys = Arc::new(keys);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let controller = Arc::clone(&self);

        let handle = tokio::spawn(async move {
            let mut shutdown = shutdown_rx;
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if *shutdown.borrow() {
                            break;
                        }
                        // a tick in flight always runs to completion
                        controller.run_tick(&keys).await;
                    }
                    _ = shutdown.changed() => break,
                }
            }
            info!("[controller] Tick loop stopped");
        });

        *self.shutdown.lock().unwrap_or_else(|e| e.into_inner()) = Some(shutdown_tx);
        *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    /// Stop ticking. Safe to call when not running.
    pub async fn stop(&self) {
        let shutdown = self
            .shutdown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(shutdown) = shutdown {
            info!("[controller] Stopping tick loop");
            let _ = shutdown.send(true);
        }
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// One scheduler tick. Public for scenario tests that drive the
    /// controller without the interval task.
    pub async fn run_tick(&self, keys: &KeyPair) {
        let head = match self.chain.head().await {
            Ok(head) => head,
            Err(e) => {
                // the next tick is the retry
                warn!("[controller] Head fetch failed: {}", e);
                return;
            }
        };

        if let Err(e) = self.revealer.tick(keys, &head).await {
            warn!("[controller] Nonce reveal pass failed: {}", e);
        }

        if self.flags.baking() {
            match self.baking.tick(keys, &head).await {
                Ok(nonces) => {
                    for nonce in nonces {
                        self.revealer.add(nonce).await;
                    }
                }
                Err(e) => warn!("[controller] Baking tick failed: {}", e),
            }
        }

        if self.flags.endorsing() {
            if let Err(e) = self.endorsing.tick(keys, &head).await {
                warn!("[controller] Endorsing tick failed: {}", e);
            }
        }

        if self.flags.accusing() {
            if let Err(e) = self.accuser.tick(&head).await {
                warn!("[controller] Accuser tick failed: {}", e);
            }
        }
    }
}
