//! # Shared Types - Baker Domain Entities
//!
//! ## Components
//!
//! | Module | Contents |
//! |--------|----------|
//! | `entities` | Keys, blocks, rights, nonces, reward records |
//! | `constants` | Network constants fetched from the node |
//! | `settings` | The plain settings struct the core consumes |
//! | `storage` | Persistent key-value collaborator port |
//! | `alerts` | Fire-and-forget alert sink port |
//!
//! Library crates depend on these types and ports only; wiring concrete
//! collaborators (file store, UI alert shim) is the runtime binary's job.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alerts;
pub mod constants;
pub mod entities;
pub mod settings;
pub mod storage;

pub use alerts::{Alert, AlertSeverity, AlertSink, TracingAlertSink};
pub use constants::NetworkConstants;
pub use entities::{
    BakerKeys, BakingRight, BlockSnapshot, EndorsingRight, OperationView, SeedNonce, SentReward,
    ShellHeader,
};
pub use settings::BakerSettings;
pub use storage::{BakerStore, StorageError, UserData};
