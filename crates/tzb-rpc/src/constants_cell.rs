//! Process-wide network constants cache.
//!
//! Read-mostly shared state: writers are the explicit `load`/`set` calls at
//! startup or configuration change; every other component only reads.

use crate::node::NodeClient;
use crate::RpcError;
use shared_types::NetworkConstants;
use std::sync::RwLock;
use tracing::info;

/// Cached network constants, shared as `Arc<ConstantsCell>`.
#[derive(Debug, Default)]
pub struct ConstantsCell {
    inner: RwLock<NetworkConstants>,
}

impl ConstantsCell {
    /// Cell primed with mainnet defaults until `load` runs.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(NetworkConstants::mainnet()),
        }
    }

    /// Snapshot of the current constants.
    pub fn get(&self) -> NetworkConstants {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace the cached constants.
    pub fn set(&self, constants: NetworkConstants) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = constants;
    }

    /// Refresh from the node.
    ///
    /// # Errors
    ///
    /// Propagates the RPC failure; the cache keeps its previous value.
    pub async fn load(&self, node: &NodeClient) -> Result<(), RpcError> {
        let constants = node.constants().await?;
        info!(
            "[rpc] Network constants loaded: {} levels/cycle, pow threshold {}",
            constants.blocks_per_cycle, constants.proof_of_work_threshold
        );
        self.set(constants);
        Ok(())
    }
}
