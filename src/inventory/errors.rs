use thiserror::Error;

use crate::protocol::TargetState;

/// Failures raised by the item store and the crafting resolver.
///
/// These always propagate to the direct caller. The dispatcher is the only
/// place that turns them into outbound failure notifications.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InventoryError {
    /// Item template is missing a required field or carries an unusable value.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// Adding a new item id while every slot is taken.
    #[error("inventory full: {max_slots} slots in use")]
    CapacityExceeded { max_slots: usize },

    /// No record with this id.
    #[error("item not found: {0}")]
    NotFound(String),

    #[error("insufficient quantity of {item_id}: requested {requested}, available {available}")]
    InsufficientQuantity {
        item_id: String,
        requested: u32,
        available: u32,
    },

    #[error("item is not consumable: {0}")]
    NotConsumable(String),

    /// First recipe material the store cannot cover.
    #[error("insufficient material {item_id}: required {required}, available {available}")]
    InsufficientMaterial {
        item_id: String,
        required: u32,
        available: u32,
    },

    #[error("not a seed: {0}")]
    InvalidSeed(String),

    #[error("not a tool: {0}")]
    InvalidTool(String),

    /// Import blob is missing the item array or carries bad records.
    #[error("invalid import data: {0}")]
    InvalidImportData(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl InventoryError {
    /// Stable failure kind reported to the host.
    pub fn kind(&self) -> &'static str {
        match self {
            InventoryError::InvalidItem(_) => "InvalidItem",
            InventoryError::CapacityExceeded { .. } => "CapacityExceeded",
            InventoryError::NotFound(_) => "NotFound",
            InventoryError::InsufficientQuantity { .. } => "InsufficientQuantity",
            InventoryError::NotConsumable(_) => "NotConsumable",
            InventoryError::InsufficientMaterial { .. } => "InsufficientMaterial",
            InventoryError::InvalidSeed(_) => "InvalidSeed",
            InventoryError::InvalidTool(_) => "InvalidTool",
            InventoryError::InvalidImportData(_) => "InvalidImportData",
            InventoryError::InvalidArgument(_) => "InvalidArgument",
        }
    }

    /// Host task transition requested when this failure is reported.
    pub fn target_state(&self) -> TargetState {
        match self {
            InventoryError::CapacityExceeded { .. } => TargetState::SetNotActiveToActive,
            _ => TargetState::SetActiveToNotActive,
        }
    }
}
