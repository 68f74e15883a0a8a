//! JSON-file-backed implementation of the persistence port.
//!
//! The whole store is one JSON document rewritten atomically (write to a
//! temp file, rename over the original). A missing file is a first run, not
//! an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{
    BakerKeys, BakerSettings, BakerStore, SeedNonce, SentReward, StorageError, UserData,
};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// The on-disk document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    user: UserData,
    #[serde(default)]
    nonces: Vec<SeedNonce>,
    #[serde(default)]
    last_rewarded_cycle: Option<i32>,
    /// Cycle → sent payouts (string keys for JSON object compatibility)
    #[serde(default)]
    sent_rewards: HashMap<String, Vec<SentReward>>,
}

/// File-backed [`BakerStore`].
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Bind to a document path. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_document(&self) -> Result<StoreDocument, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StorageError::Corrupt(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    async fn write_document(&self, document: &StoreDocument) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    async fn update<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut StoreDocument),
    {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        mutate(&mut document);
        self.write_document(&document).await
    }
}

#[async_trait]
impl BakerStore for JsonFileStore {
    async fn get_user_data(&self) -> Result<UserData, StorageError> {
        Ok(self.read_document().await?.user)
    }

    async fn set_baker_keys(&self, keys: BakerKeys) -> Result<(), StorageError> {
        self.update(|doc| doc.user.keys = Some(keys)).await
    }

    async fn set_baker_settings(&self, settings: BakerSettings) -> Result<(), StorageError> {
        self.update(|doc| doc.user.settings = Some(settings)).await
    }

    async fn get_baker_nonces(&self) -> Result<Vec<SeedNonce>, StorageError> {
        Ok(self.read_document().await?.nonces)
    }

    async fn set_baker_nonces(&self, nonces: Vec<SeedNonce>) -> Result<(), StorageError> {
        self.update(|doc| doc.nonces = nonces).await
    }

    async fn get_last_rewarded_cycle(&self) -> Result<Option<i32>, StorageError> {
        Ok(self.read_document().await?.last_rewarded_cycle)
    }

    async fn set_last_rewarded_cycle(&self, cycle: i32) -> Result<(), StorageError> {
        self.update(|doc| doc.last_rewarded_cycle = Some(cycle)).await
    }

    async fn get_sent_rewards_by_cycle(
        &self,
        cycle: i32,
    ) -> Result<Vec<SentReward>, StorageError> {
        Ok(self
            .read_document()
            .await?
            .sent_rewards
            .remove(&cycle.to_string())
            .unwrap_or_default())
    }

    async fn set_sent_rewards_by_cycle(
        &self,
        cycle: i32,
        rewards: Vec<SentReward>,
    ) -> Result<(), StorageError> {
        self.update(|doc| {
            doc.sent_rewards.insert(cycle.to_string(), rewards);
        })
        .await
    }
}
