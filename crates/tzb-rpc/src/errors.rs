//! RPC error types.

use thiserror::Error;

/// Errors surfaced by node and indexer calls.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Transport-level failure (timeout, DNS, TLS)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Could not reach the endpoint at all
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The endpoint answered with an empty body where one was required
    #[error("Empty response")]
    EmptyResponse,

    /// The node rejected the request and returned an error body
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Response body did not parse as the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),
}
