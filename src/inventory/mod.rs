//! Inventory state engine: the item store, the crafting resolver and the
//! host variable mirror.

pub mod crafting;
pub mod errors;
pub mod store;
pub mod types;
pub mod variables;

pub use crafting::{
    craft, harvest, plant_seed, upgrade_tool, CraftOutcome, PlantedSeed, Recipe, RecipeMaterial,
    UpgradeOutcome, TOOL_EFFICIENCY_GROWTH,
};
pub use errors::InventoryError;
pub use store::{ItemStore, DEFAULT_MAX_SLOTS};
pub use types::*;
pub use variables::{PortalsVariables, VariableValue};
