//! Outbound ports for the decision loops.
//!
//! `ChainClient` is the narrow node surface the engines consume; the real
//! implementation wraps `tzb_rpc::NodeClient`, tests script their own.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{BakingRight, BlockSnapshot, EndorsingRight, NetworkConstants};
use tzb_rpc::{NodeClient, PendingOperations, PreappliedBlock, RpcError};

/// Node surface consumed by the engines.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current head snapshot.
    async fn head(&self) -> Result<BlockSnapshot, RpcError>;

    /// Snapshot of an arbitrary block id (`head~2`, a hash, ...).
    async fn block(&self, block_id: &str) -> Result<BlockSnapshot, RpcError>;

    /// Operation hashes of a block, grouped by validation pass.
    async fn operation_hashes(&self, block_id: &str) -> Result<Vec<Vec<String>>, RpcError>;

    /// Network constants from the head context.
    async fn constants(&self) -> Result<NetworkConstants, RpcError>;

    /// Baking rights for `delegate` at `level`.
    async fn baking_rights(
        &self,
        delegate: &str,
        level: i32,
        max_priority: i32,
    ) -> Result<Vec<BakingRight>, RpcError>;

    /// Endorsing rights for `delegate` at `level`.
    async fn endorsing_rights(
        &self,
        delegate: &str,
        level: i32,
    ) -> Result<Vec<EndorsingRight>, RpcError>;

    /// Last used counter of a contract.
    async fn counter(&self, pkh: &str) -> Result<u64, RpcError>;

    /// Revealed manager key of a contract, when present.
    async fn manager_key(&self, pkh: &str) -> Result<Option<String>, RpcError>;

    /// Applied mempool operations for block assembly.
    async fn pending_operations(&self) -> Result<PendingOperations, RpcError>;

    /// Forge operation contents remotely; returns the forged hex.
    async fn forge_operations(&self, body: &Value) -> Result<String, RpcError>;

    /// Forge a shell block header; returns the forged hex.
    async fn forge_block_header(&self, shell_header: &Value) -> Result<String, RpcError>;

    /// Preapply a block candidate.
    async fn preapply_block(
        &self,
        body: &Value,
        timestamp: i64,
    ) -> Result<PreappliedBlock, RpcError>;

    /// Preapply signed operations.
    async fn preapply_operations(&self, body: &Value) -> Result<Vec<Value>, RpcError>;

    /// Inject a signed block; returns its hash.
    async fn inject_block(&self, body: &Value) -> Result<String, RpcError>;

    /// Inject a signed operation; returns its hash.
    async fn inject_operation(&self, signed_hex: &str) -> Result<String, RpcError>;
}

#[async_trait]
impl ChainClient for NodeClient {
    async fn head(&self) -> Result<BlockSnapshot, RpcError> {
        NodeClient::head(self).await
    }

    async fn block(&self, block_id: &str) -> Result<BlockSnapshot, RpcError> {
        NodeClient::block(self, block_id).await
    }

    async fn operation_hashes(&self, block_id: &str) -> Result<Vec<Vec<String>>, RpcError> {
        NodeClient::operation_hashes(self, block_id).await
    }

    async fn constants(&self) -> Result<NetworkConstants, RpcError> {
        NodeClient::constants(self).await
    }

    async fn baking_rights(
        &self,
        delegate: &str,
        level: i32,
        max_priority: i32,
    ) -> Result<Vec<BakingRight>, RpcError> {
        NodeClient::baking_rights(self, delegate, level, max_priority).await
    }

    async fn endorsing_rights(
        &self,
        delegate: &str,
        level: i32,
    ) -> Result<Vec<EndorsingRight>, RpcError> {
        NodeClient::endorsing_rights(self, delegate, level).await
    }

    async fn counter(&self, pkh: &str) -> Result<u64, RpcError> {
        NodeClient::counter(self, pkh).await
    }

    async fn manager_key(&self, pkh: &str) -> Result<Option<String>, RpcError> {
        NodeClient::manager_key(self, pkh).await
    }

    async fn pending_operations(&self) -> Result<PendingOperations, RpcError> {
        NodeClient::pending_operations(self).await
    }

    async fn forge_operations(&self, body: &Value) -> Result<String, RpcError> {
        NodeClient::forge_operations(self, body).await
    }

    async fn forge_block_header(&self, shell_header: &Value) -> Result<String, RpcError> {
        NodeClient::forge_block_header(self, shell_header).await
    }

    async fn preapply_block(
        &self,
        body: &Value,
        timestamp: i64,
    ) -> Result<PreappliedBlock, RpcError> {
        NodeClient::preapply_block(self, body, timestamp).await
    }

    async fn preapply_operations(&self, body: &Value) -> Result<Vec<Value>, RpcError> {
        NodeClient::preapply_operations(self, body).await
    }

    async fn inject_block(&self, body: &Value) -> Result<String, RpcError> {
        NodeClient::inject_block(self, body).await
    }

    async fn inject_operation(&self, signed_hex: &str) -> Result<String, RpcError> {
        NodeClient::inject_operation(self, signed_hex).await
    }
}
