//! # Tezos Baker Test Suite
//!
//! Unified test crate for cross-crate scenarios:
//!
//! ```text
//! tests/src/
//! ├── mock_chain.rs     # Scripted ChainClient (a well-behaved mock node)
//! ├── mock_store.rs     # In-memory BakerStore
//! └── integration/      # End-to-end engine scenarios
//! ```
//!
//! Run with `cargo test -p baker-tests`.

pub mod mock_chain;

#[cfg(test)]
mod integration;
