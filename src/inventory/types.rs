//! Item records and the value types returned by store operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute keys the engine reads from a record's opaque attribute map.
pub const ATTR_PLANT_TYPE: &str = "plantType";
pub const ATTR_GROWTH_TIME: &str = "growthTime";
pub const ATTR_LEVEL: &str = "level";
pub const ATTR_EFFICIENCY: &str = "efficiency";

/// Item category. Drives default consumability and category listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Seed,
    Plant,
    Tool,
    Fertilizer,
    Decoration,
    Resource,
}

impl ItemType {
    pub const ALL: [ItemType; 6] = [
        ItemType::Seed,
        ItemType::Plant,
        ItemType::Tool,
        ItemType::Fertilizer,
        ItemType::Decoration,
        ItemType::Resource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Seed => "seed",
            ItemType::Plant => "plant",
            ItemType::Tool => "tool",
            ItemType::Fertilizer => "fertilizer",
            ItemType::Decoration => "decoration",
            ItemType::Resource => "resource",
        }
    }

    /// Seeds and fertilizer can be used up without an explicit consumable flag.
    pub fn consumable_by_default(&self) -> bool {
        matches!(self, ItemType::Seed | ItemType::Fertilizer)
    }
}

/// One stack of a given item kind held by the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub quantity: u32,
    #[serde(default)]
    pub consumable: bool,
    /// Free-form category label; matched alongside `type` when listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
    /// Domain fields carried through untouched (plantType, growthTime, level, ...).
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ItemRecord {
    pub fn is_consumable(&self) -> bool {
        self.consumable || self.item_type.consumable_by_default()
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// True when either the type or the category label equals `category`.
    pub fn matches_category(&self, category: &str) -> bool {
        self.item_type.as_str() == category || self.category.as_deref() == Some(category)
    }

    pub(crate) fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

/// Item description supplied by the host when adding, harvesting or crafting.
///
/// Fields are optional on the wire so that a missing `id`, `name` or `type`
/// surfaces as `InvalidItem` from the store rather than a decode error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTemplate {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub item_type: Option<ItemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ItemTemplate {
    pub fn new(id: &str, name: &str, item_type: ItemType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            item_type: Some(item_type),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn consumable(mut self, consumable: bool) -> Self {
        self.consumable = Some(consumable);
        self
    }

    /// Build a fresh record. Callers validate the template first.
    pub(crate) fn into_record(mut self, item_type: ItemType, quantity: u32) -> ItemRecord {
        // Timestamps are owned by the store, never by the host.
        self.attributes.remove("addedAt");
        self.attributes.remove("lastModified");
        let now = Utc::now();
        ItemRecord {
            id: self.id.trim().to_string(),
            name: self.name,
            item_type,
            quantity,
            consumable: self.consumable.unwrap_or(false),
            category: self.category,
            added_at: now,
            last_modified: now,
            attributes: self.attributes,
        }
    }
}

/// Result of `ItemStore::add`.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOutcome {
    pub record: ItemRecord,
    /// True when the quantity merged into an existing stack.
    pub stacked: bool,
}

/// Result of `ItemStore::remove` and `ItemStore::use_item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveOutcome {
    pub item_id: String,
    pub removed_all: bool,
    pub quantity_removed: u32,
    pub remaining: u32,
}
