//! Cross-crate engine scenarios against the scripted mock node.

mod accuser_flow;
mod baking_flow;
mod endorsing_flow;
mod nonce_reveal;
mod rewards_flow;
mod sender_locking;
