//! Settings loading for the daemon.
//!
//! Order of precedence: JSON settings file, then environment overrides.
//! Only this binary reads files or the environment; the core gets a plain
//! struct.

use anyhow::{Context, Result};
use shared_types::BakerSettings;
use std::path::Path;
use tracing::info;

/// Load settings from `path` (when it exists) and apply env overrides.
pub fn load_settings(path: &Path) -> Result<BakerSettings> {
    let mut settings = if path.exists() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {:?}", path))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing settings file {:?}", path))?
    } else {
        info!("No settings file at {:?}, using sandbox defaults", path);
        BakerSettings::sandbox()
    };

    if let Ok(node_url) = std::env::var("BAKER_NODE_URL") {
        settings.node_url = node_url;
    }
    if let Ok(indexer_url) = std::env::var("BAKER_INDEXER_URL") {
        settings.indexer_url = indexer_url;
    }
    if let Ok(fee) = std::env::var("BAKER_OPERATOR_FEE_PERCENT") {
        if let Ok(fee) = fee.parse() {
            settings.operator_fee_percent = fee;
        }
    }
    if let Ok(batch) = std::env::var("BAKER_REWARD_BATCH_SIZE") {
        if let Ok(batch) = batch.parse() {
            settings.reward_batch_size = batch;
        }
    }

    Ok(settings)
}
