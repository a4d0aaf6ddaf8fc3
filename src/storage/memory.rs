use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::Result;
use crate::storage::{LocalStorage, StorageWrite};

/// In-memory storage with optional write-behind persistence.
///
/// Writes land in the map immediately and are forwarded to a `StorageWriter`
/// with `try_send`; a full or closed queue drops the persistence, never the write.
#[derive(Default)]
pub struct MemoryStorage {
    items: DashMap<String, String>,
    persist_tx: Option<mpsc::Sender<StorageWrite>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_write_behind(persist_tx: mpsc::Sender<StorageWrite>) -> Self {
        Self { items: DashMap::new(), persist_tx: Some(persist_tx) }
    }

    /// Load previously persisted items without re-persisting them.
    pub fn hydrate(&self, items: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in items {
            self.items.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).map(|v| v.value().clone()))
    }

    fn set_item(&self, key: &str, value: String) -> Result<()> {
        if let Some(tx) = &self.persist_tx {
            let write = StorageWrite { key: key.to_string(), value: value.clone() };
            if let Err(e) = tx.try_send(write) {
                warn!(key, "storage writer queue unavailable: {e}");
            }
        }
        self.items.insert(key.to_string(), value);
        Ok(())
    }
}
