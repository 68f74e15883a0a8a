//! Engine error types.

use thiserror::Error;

/// Errors that can occur in the decision loops.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Node or indexer call failed
    #[error(transparent)]
    Rpc(#[from] tzb_rpc::RpcError),

    /// Forging or forge verification failed
    #[error(transparent)]
    Forge(#[from] tzb_forge::ForgeError),

    /// Signing or key handling failed
    #[error(transparent)]
    Crypto(#[from] shared_crypto::CryptoError),

    /// Persistence failed (engines continue on in-memory state)
    #[error(transparent)]
    Storage(#[from] shared_types::StorageError),

    /// Injected operation was not seen on chain within the polling budget
    #[error("Operation {operation_hash} not included after {attempts} polls")]
    InclusionTimeout {
        /// Hash of the operation that never appeared
        operation_hash: String,
        /// Poll attempts spent
        attempts: u32,
    },

    /// A baking or endorsing slot passed unused. Terminal: the slot is gone.
    #[error("Missed slot at level {level}: {reason}")]
    SchedulingMiss {
        /// Level whose slot was missed
        level: i32,
        /// Why the slot was missed
        reason: String,
    },
}
