//! Typed access to inbound payload fields.
//!
//! Missing or ill-typed fields become `InvalidArgument`, except item
//! templates which report `InvalidItem` to match the store's own check.

use serde_json::{Map, Value};

use crate::inventory::{InventoryError, ItemTemplate, Recipe, RecipeMaterial};

#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Payload<'a> {
    pub fn new(fields: &'a Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Field value, treating explicit `null` as absent.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn optional_str(&self, key: &str) -> Result<Option<&'a str>, InventoryError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.as_str())),
            Some(other) => Err(InventoryError::InvalidArgument(format!(
                "{} must be a non-empty string, got {}",
                key, other
            ))),
        }
    }

    pub fn required_str(&self, key: &str) -> Result<&'a str, InventoryError> {
        self.optional_str(key)?
            .ok_or_else(|| InventoryError::InvalidArgument(format!("missing {}", key)))
    }

    /// First present string among `keys`.
    pub fn first_str(&self, keys: &[&str]) -> Result<&'a str, InventoryError> {
        for key in keys {
            if let Some(value) = self.optional_str(key)? {
                return Ok(value);
            }
        }
        Err(InventoryError::InvalidArgument(format!(
            "missing {}",
            keys.join(" or ")
        )))
    }

    /// Positive integer quantity; absent or `null` yields `None`.
    pub fn quantity(&self, key: &str) -> Result<Option<u32>, InventoryError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        match value.as_u64() {
            Some(q) if q >= 1 && q <= u32::MAX as u64 => Ok(Some(q as u32)),
            _ => Err(InventoryError::InvalidArgument(format!(
                "{} must be a positive integer, got {}",
                key, value
            ))),
        }
    }

    pub fn object(&self, key: &str) -> Result<&'a Map<String, Value>, InventoryError> {
        match self.get(key) {
            Some(Value::Object(map)) => Ok(map),
            Some(other) => Err(InventoryError::InvalidArgument(format!(
                "{} must be an object, got {}",
                key, other
            ))),
            None => Err(InventoryError::InvalidArgument(format!("missing {}", key))),
        }
    }

    pub fn item(&self, key: &str) -> Result<ItemTemplate, InventoryError> {
        let value = self
            .get(key)
            .ok_or_else(|| InventoryError::InvalidItem(format!("missing {}", key)))?;
        serde_json::from_value(value.clone())
            .map_err(|e| InventoryError::InvalidItem(format!("{}: {}", key, e)))
    }

    pub fn recipe(&self, key: &str) -> Result<Recipe, InventoryError> {
        let value = self
            .get(key)
            .ok_or_else(|| InventoryError::InvalidArgument(format!("missing {}", key)))?;
        serde_json::from_value(value.clone())
            .map_err(|e| InventoryError::InvalidArgument(format!("{}: {}", key, e)))
    }

    /// Material list; absent means no materials.
    pub fn materials(&self, key: &str) -> Result<Vec<RecipeMaterial>, InventoryError> {
        let Some(value) = self.get(key) else {
            return Ok(Vec::new());
        };
        serde_json::from_value(value.clone())
            .map_err(|e| InventoryError::InvalidArgument(format!("{}: {}", key, e)))
    }

    /// Best guess at the id a command concerns, used to name failure tasks.
    pub fn id_hint(&self) -> Option<&'a str> {
        for key in ["itemId", "toolId", "seedId"] {
            if let Some(Value::String(s)) = self.get(key) {
                return Some(s.as_str());
            }
        }
        for key in ["item", "produce"] {
            if let Some(Value::String(s)) = self.get(key).and_then(|v| v.get("id")) {
                return Some(s.as_str());
            }
        }
        match self
            .get("recipe")
            .and_then(|r| r.get("result"))
            .and_then(|r| r.get("id"))
        {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}
