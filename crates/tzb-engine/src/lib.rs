//! # Baker Engine - Decision Loops and Scheduling
//!
//! ## Components
//!
//! | Module | Contents |
//! |--------|----------|
//! | `ports` | `ChainClient`, the node surface the engines consume |
//! | `sender` | Manager-operation pipeline with per-source locking |
//! | `baking` | Per-level bake state machine and pending-block queue |
//! | `endorsing` | One-shot-per-level endorsement machine |
//! | `nonces` | Seed nonce reveal windows |
//! | `accuser` | Double-bake / double-endorse detection |
//! | `controller` | Fixed-interval scheduler over all of the above |
//!
//! ## Concurrency Model
//!
//! One logical scheduler task drives every engine sequentially within a
//! tick; the engines share no mutable state across ticks except behind
//! their own locks. Network calls are async; only the reward pipeline ever
//! waits for inclusion. Stopping the controller cancels future ticks but
//! never interrupts a tick already in flight.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accuser;
pub mod baking;
pub mod controller;
pub mod endorsing;
pub mod errors;
pub mod nonces;
pub mod ports;
pub mod sender;

pub use accuser::Accuser;
pub use baking::{BakingEngine, PendingBlock};
pub use controller::{BakerController, EngineFlags};
pub use endorsing::EndorsingEngine;
pub use errors::EngineError;
pub use nonces::NonceRevealer;
pub use ports::ChainClient;
pub use sender::{OperationSender, SendOutcome};
