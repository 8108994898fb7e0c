use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::{LogicId, SlotHash};

/// Read access to logic storage, keyed by `0x`-hex slot.
///
/// An unset slot reads as empty bytes.
#[async_trait]
pub trait StorageReader: Send + Sync {
    async fn get_storage_at(&self, logic: &LogicId, slot: &str) -> anyhow::Result<Vec<u8>>;

    /// Ephemeral storage of the participant `address` for `logic`.
    async fn get_ephemeral_storage_at(
        &self,
        address: &str,
        logic: &LogicId,
        slot: &str,
    ) -> anyhow::Result<Vec<u8>>;
}

type SlotKey = (String, String);

/// In-memory storage for tests and local tooling.
#[derive(Debug, Default)]
pub struct MemStorage {
    persistent: RwLock<HashMap<SlotKey, Vec<u8>>>,
    ephemeral: RwLock<HashMap<(String, SlotKey), Vec<u8>>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, logic: &LogicId, slot: &SlotHash, bytes: Vec<u8>) {
        let key = (logic.to_string(), slot.to_hex());
        self.persistent
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, bytes);
    }

    pub fn insert_ephemeral(&self, address: &str, logic: &LogicId, slot: &SlotHash, bytes: Vec<u8>) {
        let key = (address.to_lowercase(), (logic.to_string(), slot.to_hex()));
        self.ephemeral
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, bytes);
    }
}

#[async_trait]
impl StorageReader for MemStorage {
    async fn get_storage_at(&self, logic: &LogicId, slot: &str) -> anyhow::Result<Vec<u8>> {
        let guard = self
            .persistent
            .read()
            .map_err(|_| anyhow::anyhow!("persistent storage lock poisoned"))?;
        Ok(guard
            .get(&(logic.to_string(), slot.to_lowercase()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_ephemeral_storage_at(
        &self,
        address: &str,
        logic: &LogicId,
        slot: &str,
    ) -> anyhow::Result<Vec<u8>> {
        let guard = self
            .ephemeral
            .read()
            .map_err(|_| anyhow::anyhow!("ephemeral storage lock poisoned"))?;
        let key = (address.to_lowercase(), (logic.to_string(), slot.to_lowercase()));
        Ok(guard.get(&key).cloned().unwrap_or_default())
    }
}
