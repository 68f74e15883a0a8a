//! Typed facade over the node's RPC surface.
//!
//! Paths are fixed to the main chain. Shapes that must round-trip verbatim
//! into later calls (preapply shell headers, applied operations) stay as raw
//! JSON values; everything the engines branch on is typed.

use crate::client::HttpClient;
use crate::RpcError;
use serde::Deserialize;
use serde_json::Value;
use shared_types::{BakingRight, BlockSnapshot, EndorsingRight, NetworkConstants};

/// Result of `helpers/preapply/block`.
#[derive(Clone, Debug, Deserialize)]
pub struct PreappliedBlock {
    /// Shell header to be forged and mined; passed through verbatim
    pub shell_header: Value,
    /// Per-pass operation results
    #[serde(default)]
    pub operations: Vec<Value>,
}

/// Mempool snapshot subset: operations the node would apply.
///
/// Kept as raw JSON because the same objects are passed back verbatim into
/// `preapply/block`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PendingOperations {
    /// Applied operations, ready for block inclusion
    #[serde(default)]
    pub applied: Vec<Value>,
}

/// Client for one node endpoint.
#[derive(Clone, Debug)]
pub struct NodeClient {
    http: HttpClient,
}

impl NodeClient {
    /// Bind to a node base URL.
    ///
    /// # Errors
    ///
    /// `Http` when the underlying client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RpcError> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
        })
    }

    /// Current head snapshot.
    pub async fn head(&self) -> Result<BlockSnapshot, RpcError> {
        self.http.get("/chains/main/blocks/head", &[]).await
    }

    /// Snapshot of an arbitrary block (`head`, a hash, `head~2`, ...).
    pub async fn block(&self, block_id: &str) -> Result<BlockSnapshot, RpcError> {
        self.http
            .get(&format!("/chains/main/blocks/{}", block_id), &[])
            .await
    }

    /// Operation hashes of a block, grouped by validation pass.
    pub async fn operation_hashes(&self, block_id: &str) -> Result<Vec<Vec<String>>, RpcError> {
        self.http
            .get(
                &format!("/chains/main/blocks/{}/operation_hashes", block_id),
                &[],
            )
            .await
    }

    /// Network constants from the head context.
    pub async fn constants(&self) -> Result<NetworkConstants, RpcError> {
        self.http
            .get("/chains/main/blocks/head/context/constants", &[])
            .await
    }

    /// Baking rights for `delegate` at `level`.
    pub async fn baking_rights(
        &self,
        delegate: &str,
        level: i32,
        max_priority: i32,
    ) -> Result<Vec<BakingRight>, RpcError> {
        self.http
            .get(
                "/chains/main/blocks/head/helpers/baking_rights",
                &[
                    ("delegate", delegate.to_string()),
                    ("level", level.to_string()),
                    ("max_priority", max_priority.to_string()),
                ],
            )
            .await
    }

    /// Endorsing rights for `delegate` at `level`.
    pub async fn endorsing_rights(
        &self,
        delegate: &str,
        level: i32,
    ) -> Result<Vec<EndorsingRight>, RpcError> {
        self.http
            .get(
                "/chains/main/blocks/head/helpers/endorsing_rights",
                &[
                    ("delegate", delegate.to_string()),
                    ("level", level.to_string()),
                ],
            )
            .await
    }

    /// Spendable balance of a contract, in mutez.
    pub async fn balance(&self, pkh: &str) -> Result<u64, RpcError> {
        let raw: String = self
            .http
            .get(
                &format!("/chains/main/blocks/head/context/contracts/{}/balance", pkh),
                &[],
            )
            .await?;
        raw.parse()
            .map_err(|_| RpcError::Parse(format!("balance not a number: {}", raw)))
    }

    /// Last used counter of a contract.
    pub async fn counter(&self, pkh: &str) -> Result<u64, RpcError> {
        let raw: String = self
            .http
            .get(
                &format!("/chains/main/blocks/head/context/contracts/{}/counter", pkh),
                &[],
            )
            .await?;
        raw.parse()
            .map_err(|_| RpcError::Parse(format!("counter not a number: {}", raw)))
    }

    /// Revealed manager key of a contract, when present.
    pub async fn manager_key(&self, pkh: &str) -> Result<Option<String>, RpcError> {
        self.http
            .get(
                &format!(
                    "/chains/main/blocks/head/context/contracts/{}/manager_key",
                    pkh
                ),
                &[],
            )
            .await
    }

    /// Applied mempool operations for block assembly.
    pub async fn pending_operations(&self) -> Result<PendingOperations, RpcError> {
        self.http
            .get("/chains/main/mempool/pending_operations", &[])
            .await
    }

    /// Forge operation contents remotely; returns the forged hex.
    pub async fn forge_operations(&self, body: &Value) -> Result<String, RpcError> {
        self.http
            .post("/chains/main/blocks/head/helpers/forge/operations", &[], body)
            .await
    }

    /// Forge a shell block header; returns the forged hex.
    pub async fn forge_block_header(&self, shell_header: &Value) -> Result<String, RpcError> {
        #[derive(Deserialize)]
        struct Forged {
            block: String,
        }
        let forged: Forged = self
            .http
            .post(
                "/chains/main/blocks/head/helpers/forge_block_header",
                &[],
                shell_header,
            )
            .await?;
        Ok(forged.block)
    }

    /// Preapply a block candidate; `timestamp` must match the slot time.
    pub async fn preapply_block(
        &self,
        body: &Value,
        timestamp: i64,
    ) -> Result<PreappliedBlock, RpcError> {
        self.http
            .post(
                "/chains/main/blocks/head/helpers/preapply/block",
                &[
                    ("sort", "true".to_string()),
                    ("timestamp", timestamp.to_string()),
                ],
                body,
            )
            .await
    }

    /// Preapply signed operations.
    pub async fn preapply_operations(&self, body: &Value) -> Result<Vec<Value>, RpcError> {
        self.http
            .post(
                "/chains/main/blocks/head/helpers/preapply/operations",
                &[],
                body,
            )
            .await
    }

    /// Inject a signed block; returns its hash.
    pub async fn inject_block(&self, body: &Value) -> Result<String, RpcError> {
        self.http
            .post("/injection/block", &[("chain", "main".to_string())], body)
            .await
    }

    /// Inject a signed operation (hex payload‖signature); returns its hash.
    pub async fn inject_operation(&self, signed_hex: &str) -> Result<String, RpcError> {
        self.http
            .post(
                "/injection/operation",
                &[("chain", "main".to_string())],
                &signed_hex,
            )
            .await
    }
}
