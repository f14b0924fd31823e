//! # Persistence Gateway
//!
//! Serializes the item store to a single JSON blob and hands it to a
//! [`StorageBackend`]. Persistence is best-effort: write failures are logged
//! and swallowed so gameplay never blocks on durability, and a missing or
//! corrupt blob on startup simply means "no prior state".
//!
//! A blob that parses but cannot be restored into the current store (more
//! items than `max_slots`, duplicate ids) is kept: the gateway stops flushing
//! until an import or reset replaces it.
//!
//! ## Blob format
//!
//! ```json
//! {
//!   "items": [ { "id": "seed-1", "name": "Carrot Seed", "type": "seed", "quantity": 3, ... } ],
//!   "metadata": { "exportedAt": "2024-05-01T10:00:00Z", "maxSlots": 50, "itemCount": 1 }
//! }
//! ```

pub mod file;
pub mod memory;
pub mod sled_store;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{StorageBackendKind, StorageConfig};
use crate::inventory::{InventoryError, ItemRecord, ItemStore};

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use sled_store::SledStorage;

/// Durable string-blob storage collaborator.
pub trait StorageBackend: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn clear(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMetadata {
    pub exported_at: DateTime<Utc>,
    pub max_slots: usize,
    pub item_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedBlob {
    pub items: Vec<ItemRecord>,
    pub metadata: BlobMetadata,
}

impl PersistedBlob {
    pub fn from_store(store: &ItemStore) -> Self {
        let items = store.snapshot();
        Self {
            metadata: BlobMetadata {
                exported_at: Utc::now(),
                max_slots: store.max_slots(),
                item_count: items.len(),
            },
            items,
        }
    }
}

/// Open the backend selected in config.
pub fn open_backend(config: &StorageConfig) -> Result<Box<dyn StorageBackend>> {
    let backend: Box<dyn StorageBackend> = match config.backend {
        StorageBackendKind::File => Box::new(FileStorage::new(&config.data_dir)?),
        StorageBackendKind::Sled => {
            let path = std::path::Path::new(&config.data_dir).join("inventory.sled");
            Box::new(SledStorage::open(path)?)
        }
        StorageBackendKind::Memory => Box::new(MemoryStorage::new()),
    };
    Ok(backend)
}

/// Parse an import blob. `items` must be present and an array of valid records.
pub fn decode_items(text: &str) -> Result<Vec<ItemRecord>, InventoryError> {
    let value: Value = serde_json::from_str(text.trim_start_matches('\0'))
        .map_err(|e| InventoryError::InvalidImportData(format!("not JSON: {}", e)))?;
    let Some(entries) = value.get("items").and_then(Value::as_array) else {
        return Err(InventoryError::InvalidImportData(
            "missing items array".into(),
        ));
    };
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            serde_json::from_value::<ItemRecord>(entry.clone()).map_err(|e| {
                InventoryError::InvalidImportData(format!("item {}: {}", idx, e))
            })
        })
        .collect()
}

pub struct PersistenceGateway {
    backend: Box<dyn StorageBackend>,
    storage_key: String,
    auto_save: bool,
    /// Set when a saved blob was refused on load. Flushes are skipped.
    guarded: bool,
}

impl PersistenceGateway {
    pub fn new(backend: Box<dyn StorageBackend>, storage_key: &str, auto_save: bool) -> Self {
        Self {
            backend,
            storage_key: storage_key.to_string(),
            auto_save,
            guarded: false,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn auto_save(&self) -> bool {
        self.auto_save
    }

    /// True while a refused blob is being protected from overwrite.
    pub fn is_guarded(&self) -> bool {
        self.guarded
    }

    /// Pretty JSON blob for the current store content.
    pub fn export_json(store: &ItemStore) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&PersistedBlob::from_store(store))
    }

    /// Best-effort write of the store. Never fails the caller.
    pub fn flush(&mut self, store: &ItemStore) {
        if !self.auto_save {
            debug!("auto_save disabled; skipping flush");
            return;
        }
        if self.guarded {
            warn!(
                "not saving over unrestored inventory under {}; import or reset it first",
                self.storage_key
            );
            return;
        }
        self.write(store);
    }

    fn write(&mut self, store: &ItemStore) {
        let blob = match Self::export_json(store) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("failed to encode inventory: {}", e);
                return;
            }
        };
        match self.backend.set(&self.storage_key, &blob) {
            Ok(()) => debug!("saved {} items under {}", store.len(), self.storage_key),
            Err(e) => warn!("failed to save inventory under {}: {}", self.storage_key, e),
        }
    }

    /// Load prior state into `store`. Returns the number of items restored.
    pub fn hydrate(&mut self, store: &mut ItemStore) -> usize {
        if !self.auto_save {
            debug!("auto_save disabled; starting empty");
            return 0;
        }
        self.load(store)
    }

    /// Read the persisted blob regardless of `auto_save`.
    pub fn load(&mut self, store: &mut ItemStore) -> usize {
        let text = match self.backend.get(&self.storage_key) {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!("no saved inventory under {}", self.storage_key);
                return 0;
            }
            Err(e) => {
                warn!("failed to read inventory under {}: {}", self.storage_key, e);
                return 0;
            }
        };
        let items = match decode_items(&text) {
            Ok(items) => items,
            Err(e) => {
                warn!("ignoring saved inventory under {}: {}", self.storage_key, e);
                return 0;
            }
        };
        match store.restore(items) {
            Ok(()) => {
                info!("restored {} items from {}", store.len(), self.storage_key);
                store.len()
            }
            Err(e) => {
                warn!(
                    "saved inventory under {} does not fit this store ({}); leaving it untouched",
                    self.storage_key, e
                );
                self.guarded = true;
                0
            }
        }
    }

    /// Replace the store from an export blob and persist it.
    pub fn import_json(&mut self, store: &mut ItemStore, text: &str) -> Result<usize, InventoryError> {
        let items = decode_items(text)?;
        store.restore(items)?;
        self.guarded = false;
        self.write(store);
        Ok(store.len())
    }

    /// Delete the persisted blob.
    pub fn reset(&mut self) -> Result<()> {
        self.backend.clear(&self.storage_key)?;
        self.guarded = false;
        Ok(())
    }
}
