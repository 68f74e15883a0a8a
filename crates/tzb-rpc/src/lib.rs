//! # RPC Client - Node and Indexer Facades
//!
//! ## Components
//!
//! | Module | Contents |
//! |--------|----------|
//! | `client` | Shared JSON-over-HTTP plumbing |
//! | `node` | Typed node RPC surface (`/chains/main/...`) |
//! | `indexer` | Paginated delegator-reward reports |
//! | `constants_cell` | Read-mostly cached network constants |
//!
//! Failures surface as `RpcError`; polling callers treat them as transient
//! and rely on the next scheduler tick as the retry mechanism.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod constants_cell;
pub mod errors;
pub mod indexer;
pub mod node;

pub use client::HttpClient;
pub use constants_cell::ConstantsCell;
pub use errors::RpcError;
pub use indexer::{DelegatorShare, IndexerClient, RewardsPage};
pub use node::{NodeClient, PendingOperations, PreappliedBlock};
