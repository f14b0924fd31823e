//! Multi-item transactions: crafting, tool upgrades, harvesting and planting.
//!
//! Every transaction runs a validation pass over the whole store before the
//! first mutation, so a failure never leaves materials half consumed.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::errors::InventoryError;
use super::store::ItemStore;
use super::types::{
    AddOutcome, ItemRecord, ItemTemplate, ItemType, RemoveOutcome, ATTR_EFFICIENCY,
    ATTR_GROWTH_TIME, ATTR_LEVEL, ATTR_PLANT_TYPE,
};

/// Efficiency multiplier applied on every tool upgrade.
pub const TOOL_EFFICIENCY_GROWTH: f64 = 1.2;

/// One material requirement of a recipe or upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeMaterial {
    pub id: String,
    pub quantity: u32,
}

impl RecipeMaterial {
    pub fn new(id: &str, quantity: u32) -> Self {
        Self {
            id: id.to_string(),
            quantity,
        }
    }
}

/// Ephemeral craft description supplied with a craft command. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(default)]
    pub materials: Vec<RecipeMaterial>,
    pub result: ItemTemplate,
    #[serde(default = "default_result_quantity")]
    pub result_quantity: u32,
}

fn default_result_quantity() -> u32 {
    1
}

impl Recipe {
    pub fn new(result: ItemTemplate) -> Self {
        Self {
            materials: Vec::new(),
            result,
            result_quantity: 1,
        }
    }

    pub fn with_material(mut self, id: &str, quantity: u32) -> Self {
        self.materials.push(RecipeMaterial::new(id, quantity));
        self
    }

    pub fn yielding(mut self, quantity: u32) -> Self {
        self.result_quantity = quantity;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CraftOutcome {
    pub consumed: Vec<RemoveOutcome>,
    pub produced: AddOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeOutcome {
    pub consumed: Vec<RemoveOutcome>,
    pub tool: ItemRecord,
}

/// Growth metadata handed back to the host after planting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantedSeed {
    pub seed_id: String,
    pub plant_type: Option<Value>,
    pub growth_time: Option<Value>,
    pub remaining: u32,
}

/// Sum requirements per id, scaled by `times`. Ids keep first-seen order.
fn requirements(
    materials: &[RecipeMaterial],
    times: u32,
) -> Result<Vec<(String, u32)>, InventoryError> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: BTreeMap<String, u32> = BTreeMap::new();
    for material in materials {
        if material.id.trim().is_empty() {
            return Err(InventoryError::InvalidArgument(
                "material id is required".into(),
            ));
        }
        if material.quantity == 0 {
            return Err(InventoryError::InvalidArgument(format!(
                "material {} needs a positive quantity",
                material.id
            )));
        }
        let needed = material.quantity.checked_mul(times).ok_or_else(|| {
            InventoryError::InvalidArgument(format!("quantity overflow for {}", material.id))
        })?;
        let total = totals.entry(material.id.clone()).or_insert_with(|| {
            order.push(material.id.clone());
            0
        });
        *total = total.checked_add(needed).ok_or_else(|| {
            InventoryError::InvalidArgument(format!("quantity overflow for {}", material.id))
        })?;
    }
    Ok(order
        .into_iter()
        .map(|id| {
            let total = totals.get(&id).copied().unwrap_or(0);
            (id, total)
        })
        .collect())
}

/// Fail with the first requirement the store cannot cover.
fn check_materials(store: &ItemStore, needs: &[(String, u32)]) -> Result<(), InventoryError> {
    for (id, required) in needs {
        let available = store.quantity_of(id);
        if available < *required {
            return Err(InventoryError::InsufficientMaterial {
                item_id: id.clone(),
                required: *required,
                available,
            });
        }
    }
    Ok(())
}

fn consume(
    store: &mut ItemStore,
    needs: &[(String, u32)],
) -> Result<Vec<RemoveOutcome>, InventoryError> {
    needs
        .iter()
        .map(|(id, required)| store.remove(id, Some(*required)))
        .collect()
}

/// Consume `recipe` materials `quantity` times and add the result.
pub fn craft(
    store: &mut ItemStore,
    recipe: &Recipe,
    quantity: u32,
) -> Result<CraftOutcome, InventoryError> {
    if quantity == 0 || recipe.result_quantity == 0 {
        return Err(InventoryError::InvalidArgument(
            "craft quantity must be at least 1".into(),
        ));
    }
    let needs = requirements(&recipe.materials, quantity)?;
    let produced_quantity = recipe.result_quantity.checked_mul(quantity).ok_or_else(|| {
        InventoryError::InvalidArgument("result quantity overflow".into())
    })?;
    check_materials(store, &needs)?;

    // Dry-run the result add against a copy so capacity or template problems
    // surface before anything is consumed.
    let mut preview = store.clone();
    consume(&mut preview, &needs)?;
    preview.add(recipe.result.clone(), produced_quantity)?;

    let consumed = consume(store, &needs)?;
    let produced = store.add(recipe.result.clone(), produced_quantity)?;
    info!(
        "crafted {} x{} from {} material kinds",
        produced.record.id,
        produced_quantity,
        consumed.len()
    );
    Ok(CraftOutcome { consumed, produced })
}

/// Current tool level; absent means 1. Integral floats such as `2.0` are accepted.
fn tool_level(tool: &ItemRecord) -> Result<u64, InventoryError> {
    let Some(value) = tool.attribute(ATTR_LEVEL).filter(|v| !v.is_null()) else {
        return Ok(1);
    };
    if let Some(level) = value.as_u64() {
        return Ok(level);
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => Ok(f as u64),
        _ => Err(InventoryError::InvalidArgument(format!(
            "tool {} has a non-integer level {}",
            tool.id, value
        ))),
    }
}

/// Spend `materials` to raise a tool's level by one and its efficiency by 20%.
pub fn upgrade_tool(
    store: &mut ItemStore,
    tool_id: &str,
    materials: &[RecipeMaterial],
) -> Result<UpgradeOutcome, InventoryError> {
    let tool = store
        .get(tool_id)
        .ok_or_else(|| InventoryError::NotFound(tool_id.to_string()))?;
    if tool.item_type != ItemType::Tool {
        return Err(InventoryError::InvalidTool(tool_id.to_string()));
    }
    if materials.iter().any(|m| m.id == tool_id) {
        return Err(InventoryError::InvalidArgument(format!(
            "tool {} cannot be spent on its own upgrade",
            tool_id
        )));
    }

    let level = tool_level(tool)?;
    let next_level = level.checked_add(1).ok_or_else(|| {
        InventoryError::InvalidArgument(format!("tool {} is already at the maximum level", tool_id))
    })?;
    let efficiency = tool
        .attribute(ATTR_EFFICIENCY)
        .and_then(Value::as_f64)
        .unwrap_or(1.0);

    let needs = requirements(materials, 1)?;
    check_materials(store, &needs)?;
    let consumed = consume(store, &needs)?;

    let mut patch = Map::new();
    patch.insert(ATTR_LEVEL.to_string(), json!(next_level));
    patch.insert(
        ATTR_EFFICIENCY.to_string(),
        json!(efficiency * TOOL_EFFICIENCY_GROWTH),
    );
    let tool = store.update(tool_id, &patch)?;
    info!("upgraded {} to level {}", tool_id, next_level);
    Ok(UpgradeOutcome { consumed, tool })
}

/// Add harvested produce. Only store capacity or template validity can fail.
pub fn harvest(
    store: &mut ItemStore,
    produce: ItemTemplate,
    quantity: u32,
) -> Result<AddOutcome, InventoryError> {
    let outcome = store.add(produce, quantity)?;
    debug!("harvested {} x{}", outcome.record.id, quantity);
    Ok(outcome)
}

/// Spend one seed and return its growth metadata. Growth itself is simulated by the host.
pub fn plant_seed(store: &mut ItemStore, seed_id: &str) -> Result<PlantedSeed, InventoryError> {
    let seed = store
        .get(seed_id)
        .ok_or_else(|| InventoryError::NotFound(seed_id.to_string()))?;
    if seed.item_type != ItemType::Seed {
        return Err(InventoryError::InvalidSeed(seed_id.to_string()));
    }
    let plant_type = seed.attribute(ATTR_PLANT_TYPE).cloned();
    let growth_time = seed.attribute(ATTR_GROWTH_TIME).cloned();

    let used = store.use_item(seed_id, 1)?;
    Ok(PlantedSeed {
        seed_id: seed_id.to_string(),
        plant_type,
        growth_time,
        remaining: used.remaining,
    })
}
