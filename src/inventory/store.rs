//! Authoritative in-memory item store.
//!
//! Invariants held by every operation:
//! - at most `max_slots` records; a new id at capacity is rejected before insertion
//! - every stored record has `quantity >= 1`; dropping to zero removes the record
//! - ids are unique; adding an existing id merges quantity into that stack

use std::collections::BTreeMap;

use log::debug;
use serde_json::{Map, Value};

use super::errors::InventoryError;
use super::types::{AddOutcome, ItemRecord, ItemTemplate, RemoveOutcome};

pub const DEFAULT_MAX_SLOTS: usize = 50;

#[derive(Debug, Clone)]
pub struct ItemStore {
    items: BTreeMap<String, ItemRecord>,
    max_slots: usize,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SLOTS)
    }
}

impl ItemStore {
    pub fn new(max_slots: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            max_slots,
        }
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_slots
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ItemRecord> {
        self.items.get(id)
    }

    /// Quantity held, zero when absent.
    pub fn quantity_of(&self, id: &str) -> u32 {
        self.items.get(id).map(|r| r.quantity).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemRecord> {
        self.items.values()
    }

    /// Add `quantity` units of `template`, stacking onto an existing id.
    pub fn add(
        &mut self,
        template: ItemTemplate,
        quantity: u32,
    ) -> Result<AddOutcome, InventoryError> {
        let id = template.id.trim();
        if id.is_empty() {
            return Err(InventoryError::InvalidItem("item id is required".into()));
        }
        if template.name.trim().is_empty() {
            return Err(InventoryError::InvalidItem(format!(
                "item {} has no name",
                id
            )));
        }
        let Some(item_type) = template.item_type else {
            return Err(InventoryError::InvalidItem(format!(
                "item {} has no type",
                id
            )));
        };
        if quantity == 0 {
            return Err(InventoryError::InvalidArgument(
                "quantity must be at least 1".into(),
            ));
        }

        if let Some(existing) = self.items.get_mut(id) {
            existing.quantity = existing.quantity.checked_add(quantity).ok_or_else(|| {
                InventoryError::InvalidArgument(format!("quantity overflow for {}", id))
            })?;
            existing.touch();
            debug!("stacked {} x{} (now {})", id, quantity, existing.quantity);
            return Ok(AddOutcome {
                record: existing.clone(),
                stacked: true,
            });
        }

        if self.is_full() {
            return Err(InventoryError::CapacityExceeded {
                max_slots: self.max_slots,
            });
        }

        let record = template.into_record(item_type, quantity);
        debug!("added {} x{}", record.id, quantity);
        self.items.insert(record.id.clone(), record.clone());
        Ok(AddOutcome {
            record,
            stacked: false,
        })
    }

    /// Remove `quantity` units, or the whole stack when `None` or at least the held amount.
    pub fn remove(
        &mut self,
        id: &str,
        quantity: Option<u32>,
    ) -> Result<RemoveOutcome, InventoryError> {
        if quantity == Some(0) {
            return Err(InventoryError::InvalidArgument(
                "quantity must be at least 1".into(),
            ));
        }
        let current = self
            .items
            .get(id)
            .map(|r| r.quantity)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;

        match quantity {
            Some(q) if q < current => {
                if let Some(record) = self.items.get_mut(id) {
                    record.quantity = current - q;
                    record.touch();
                }
                Ok(RemoveOutcome {
                    item_id: id.to_string(),
                    removed_all: false,
                    quantity_removed: q,
                    remaining: current - q,
                })
            }
            _ => {
                self.items.remove(id);
                Ok(RemoveOutcome {
                    item_id: id.to_string(),
                    removed_all: true,
                    quantity_removed: current,
                    remaining: 0,
                })
            }
        }
    }

    /// Merge `patch` fields into a record.
    ///
    /// `id` cannot change, timestamps are store-owned, and `quantity` must stay
    /// a positive integer. Unknown keys land in the attribute map.
    pub fn update(
        &mut self,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<ItemRecord, InventoryError> {
        let current = self
            .items
            .get(id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;

        let mut merged = match serde_json::to_value(current) {
            Ok(Value::Object(map)) => map,
            _ => {
                return Err(InventoryError::InvalidArgument(format!(
                    "record {} cannot be patched",
                    id
                )))
            }
        };

        for (key, value) in patch {
            match key.as_str() {
                "id" => {
                    if value.as_str() != Some(id) {
                        return Err(InventoryError::InvalidArgument(
                            "item id cannot be changed".into(),
                        ));
                    }
                }
                "addedAt" | "lastModified" => {}
                "quantity" => match value.as_u64() {
                    Some(q) if q >= 1 && q <= u32::MAX as u64 => {
                        merged.insert(key.clone(), value.clone());
                    }
                    _ => {
                        return Err(InventoryError::InvalidArgument(format!(
                            "quantity must be a positive integer, got {}",
                            value
                        )))
                    }
                },
                "name" => match value.as_str() {
                    Some(name) if !name.trim().is_empty() => {
                        merged.insert(key.clone(), value.clone());
                    }
                    _ => {
                        return Err(InventoryError::InvalidArgument(
                            "name must be a non-empty string".into(),
                        ))
                    }
                },
                _ => {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }

        let mut record: ItemRecord = serde_json::from_value(Value::Object(merged))
            .map_err(|e| InventoryError::InvalidArgument(format!("patch rejected: {}", e)))?;
        record.touch();
        self.items.insert(id.to_string(), record.clone());
        Ok(record)
    }

    /// Consume `quantity` units of a consumable item.
    pub fn use_item(&mut self, id: &str, quantity: u32) -> Result<RemoveOutcome, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidArgument(
                "quantity must be at least 1".into(),
            ));
        }
        let record = self
            .items
            .get(id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;
        if record.quantity < quantity {
            return Err(InventoryError::InsufficientQuantity {
                item_id: id.to_string(),
                requested: quantity,
                available: record.quantity,
            });
        }
        if !record.is_consumable() {
            return Err(InventoryError::NotConsumable(id.to_string()));
        }
        self.remove(id, Some(quantity))
    }

    /// Records whose type or category label equals `category`.
    pub fn list_by_category(&self, category: &str) -> Vec<&ItemRecord> {
        self.items
            .values()
            .filter(|r| r.matches_category(category))
            .collect()
    }

    /// Drop every record, returning how many were held.
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }

    pub fn snapshot(&self) -> Vec<ItemRecord> {
        self.items.values().cloned().collect()
    }

    /// Replace the whole store content. Nothing changes if any record is rejected.
    pub fn restore(&mut self, items: Vec<ItemRecord>) -> Result<(), InventoryError> {
        if items.len() > self.max_slots {
            return Err(InventoryError::InvalidImportData(format!(
                "{} items exceed capacity of {}",
                items.len(),
                self.max_slots
            )));
        }
        let mut restored = BTreeMap::new();
        for item in items {
            if item.id.trim().is_empty() {
                return Err(InventoryError::InvalidImportData(
                    "item without id".into(),
                ));
            }
            if item.quantity == 0 {
                return Err(InventoryError::InvalidImportData(format!(
                    "item {} has zero quantity",
                    item.id
                )));
            }
            if restored.contains_key(&item.id) {
                return Err(InventoryError::InvalidImportData(format!(
                    "duplicate item id {}",
                    item.id
                )));
            }
            restored.insert(item.id.clone(), item);
        }
        self.items = restored;
        Ok(())
    }
}
