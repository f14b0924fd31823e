//! One handler per action. Each decodes its payload, runs a single store or
//! resolver operation and reports how the host task should transition.

use serde_json::{json, Value};

use super::payload::Payload;
use super::{ActionOutcome, InventoryState};
use crate::inventory::{self, AddOutcome, InventoryError, RemoveOutcome, VariableValue};
use crate::protocol::TargetState;

fn record_json<T: serde::Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

/// New stack completes the task; stacking onto an existing one keeps it active.
fn added(outcome: &AddOutcome) -> ActionOutcome {
    let state = if outcome.stacked {
        TargetState::SetNotActiveToActive
    } else {
        TargetState::SetNotActiveToCompleted
    };
    ActionOutcome::mutation(state, Some(outcome.record.id.clone()))
        .with_data(record_json(&outcome.record))
}

fn removed(outcome: &RemoveOutcome) -> ActionOutcome {
    let state = if outcome.removed_all {
        TargetState::SetActiveToCompleted
    } else {
        TargetState::SetActiveToActive
    };
    ActionOutcome::mutation(state, Some(outcome.item_id.clone())).with_data(record_json(outcome))
}

pub fn add(state: &mut InventoryState, payload: &Payload) -> Result<ActionOutcome, InventoryError> {
    let template = payload.item("item")?;
    let quantity = payload
        .quantity("quantity")?
        .or(template.quantity)
        .unwrap_or(1);
    let outcome = state.store.add(template, quantity)?;
    Ok(added(&outcome))
}

pub fn remove(
    state: &mut InventoryState,
    payload: &Payload,
) -> Result<ActionOutcome, InventoryError> {
    let id = payload.required_str("itemId")?;
    let quantity = payload.quantity("quantity")?;
    let outcome = state.store.remove(id, quantity)?;
    Ok(removed(&outcome))
}

pub fn get(state: &mut InventoryState, payload: &Payload) -> Result<ActionOutcome, InventoryError> {
    let id = payload.required_str("itemId")?;
    let item = state.store.get(id);
    Ok(
        ActionOutcome::query(TargetState::SetNotActiveToActive, Some(id.to_string())).with_data(
            Some(json!({
                "found": item.is_some(),
                "item": item,
            })),
        ),
    )
}

pub fn update(
    state: &mut InventoryState,
    payload: &Payload,
) -> Result<ActionOutcome, InventoryError> {
    let id = payload.required_str("itemId")?;
    let patch = payload.object("updates")?;
    let record = state.store.update(id, patch)?;
    Ok(
        ActionOutcome::mutation(TargetState::SetActiveToActive, Some(record.id.clone()))
            .with_data(record_json(&record)),
    )
}

pub fn use_item(
    state: &mut InventoryState,
    payload: &Payload,
) -> Result<ActionOutcome, InventoryError> {
    let id = payload.required_str("itemId")?;
    let quantity = payload.quantity("quantity")?.unwrap_or(1);
    let outcome = state.store.use_item(id, quantity)?;
    Ok(
        ActionOutcome::mutation(TargetState::SetActiveToCompleted, Some(outcome.item_id.clone()))
            .with_data(record_json(&outcome)),
    )
}

/// One-sided debit: the target's own inventory is not modelled, only named.
pub fn transfer(
    state: &mut InventoryState,
    payload: &Payload,
) -> Result<ActionOutcome, InventoryError> {
    let id = payload.required_str("itemId")?;
    let target_id = payload.required_str("targetId")?;
    let quantity = payload.quantity("quantity")?;

    let available = state
        .store
        .get(id)
        .map(|r| r.quantity)
        .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;
    if let Some(requested) = quantity {
        if requested > available {
            return Err(InventoryError::InsufficientQuantity {
                item_id: id.to_string(),
                requested,
                available,
            });
        }
    }

    let outcome = state.store.remove(id, quantity)?;
    Ok(
        ActionOutcome::mutation(TargetState::SetActiveToCompleted, Some(outcome.item_id.clone()))
            .with_target(target_id)
            .with_data(Some(json!({
                "targetId": target_id,
                "quantity": outcome.quantity_removed,
                "remaining": outcome.remaining,
            }))),
    )
}

pub fn clear(
    state: &mut InventoryState,
    _payload: &Payload,
) -> Result<ActionOutcome, InventoryError> {
    let cleared = state.store.clear();
    Ok(ActionOutcome::mutation(TargetState::SetActiveToCompleted, None)
        .with_data(Some(json!({ "cleared": cleared }))))
}

pub fn list_by_category(
    state: &mut InventoryState,
    payload: &Payload,
) -> Result<ActionOutcome, InventoryError> {
    let category = payload.required_str("category")?;
    let items = state.store.list_by_category(category);
    Ok(
        ActionOutcome::query(TargetState::SetNotActiveToActive, None).with_data(Some(json!({
            "category": category,
            "count": items.len(),
            "items": items,
        }))),
    )
}

pub fn sync_variable(
    state: &mut InventoryState,
    payload: &Payload,
) -> Result<ActionOutcome, InventoryError> {
    let name = payload.required_str("name")?;
    let raw = payload
        .get("value")
        .ok_or_else(|| InventoryError::InvalidArgument("missing value".into()))?;
    let value = VariableValue::from_json(raw)?;
    let previous = state.variables.sync(name, value.clone())?;
    Ok(
        ActionOutcome::query(TargetState::SetNotActiveToActive, Some(name.to_string())).with_data(
            Some(json!({
                "name": name,
                "value": value,
                "previous": previous,
            })),
        ),
    )
}

pub fn plant(
    state: &mut InventoryState,
    payload: &Payload,
) -> Result<ActionOutcome, InventoryError> {
    let seed_id = payload.first_str(&["itemId", "seedId"])?;
    let planted = inventory::plant_seed(&mut state.store, seed_id)?;
    Ok(
        ActionOutcome::mutation(TargetState::SetActiveToCompleted, Some(seed_id.to_string()))
            .with_data(record_json(&planted)),
    )
}

pub fn harvest(
    state: &mut InventoryState,
    payload: &Payload,
) -> Result<ActionOutcome, InventoryError> {
    let produce = if payload.get("produce").is_some() {
        payload.item("produce")?
    } else {
        payload.item("item")?
    };
    let quantity = payload
        .quantity("quantity")?
        .or(produce.quantity)
        .unwrap_or(1);
    let outcome = inventory::harvest(&mut state.store, produce, quantity)?;
    Ok(added(&outcome))
}

pub fn upgrade(
    state: &mut InventoryState,
    payload: &Payload,
) -> Result<ActionOutcome, InventoryError> {
    let tool_id = payload.first_str(&["itemId", "toolId"])?;
    let materials = payload.materials("upgradeMaterials")?;
    let outcome = inventory::upgrade_tool(&mut state.store, tool_id, &materials)?;
    Ok(
        ActionOutcome::mutation(TargetState::SetActiveToActive, Some(tool_id.to_string()))
            .with_data(Some(json!({
                "tool": outcome.tool,
                "consumed": outcome.consumed,
            }))),
    )
}

pub fn craft(
    state: &mut InventoryState,
    payload: &Payload,
) -> Result<ActionOutcome, InventoryError> {
    let recipe = payload.recipe("recipe")?;
    let quantity = payload.quantity("quantity")?.unwrap_or(1);
    let outcome = inventory::craft(&mut state.store, &recipe, quantity)?;
    Ok(ActionOutcome::mutation(
        TargetState::SetNotActiveToCompleted,
        Some(outcome.produced.record.id.clone()),
    )
    .with_data(Some(json!({
        "item": outcome.produced.record,
        "consumed": outcome.consumed,
    }))))
}
