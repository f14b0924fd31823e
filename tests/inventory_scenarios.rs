//! Store and resolver behavior through the public library API.
use portals_inventory::inventory::{
    craft, plant_seed, upgrade_tool, InventoryError, ItemStore, ItemTemplate, ItemType, Recipe,
    RecipeMaterial,
};
use serde_json::json;

fn resource(id: &str) -> ItemTemplate {
    ItemTemplate::new(id, id, ItemType::Resource)
}

fn ids(store: &ItemStore) -> Vec<String> {
    store.iter().map(|r| r.id.clone()).collect()
}

#[test]
fn capacity_one_rejects_second_kind() {
    let mut store = ItemStore::new(1);
    store.add(resource("A"), 1).expect("first add");
    let err = store.add(resource("B"), 1).unwrap_err();
    assert!(matches!(err, InventoryError::CapacityExceeded { max_slots: 1 }));
    assert_eq!(ids(&store), vec!["A"]);

    // Stacking onto an existing id needs no free slot.
    let outcome = store.add(resource("A"), 4).expect("stack");
    assert!(outcome.stacked);
    assert_eq!(store.quantity_of("A"), 5);
}

#[test]
fn store_never_exceeds_slots() {
    let mut store = ItemStore::new(4);
    for i in 0..20 {
        let _ = store.add(resource(&format!("r{}", i % 7)), 1);
        assert!(store.len() <= 4);
        assert!(store.iter().all(|r| r.quantity >= 1));
    }
}

#[test]
fn seeds_are_used_down_to_removal() {
    let mut store = ItemStore::new(10);
    store
        .add(ItemTemplate::new("seed-1", "Carrot Seed", ItemType::Seed), 3)
        .unwrap();

    let first = store.use_item("seed-1", 2).unwrap();
    assert!(!first.removed_all);
    assert_eq!(first.remaining, 1);
    assert!(store.contains("seed-1"));

    let second = store.use_item("seed-1", 1).unwrap();
    assert!(second.removed_all);
    assert!(!store.contains("seed-1"));
}

#[test]
fn tools_are_not_consumable() {
    let mut store = ItemStore::new(10);
    store
        .add(ItemTemplate::new("hoe", "Hoe", ItemType::Tool), 1)
        .unwrap();
    assert!(matches!(
        store.use_item("hoe", 1),
        Err(InventoryError::NotConsumable(_))
    ));
    assert!(matches!(
        store.use_item("hoe", 2),
        Err(InventoryError::InsufficientQuantity { requested: 2, available: 1, .. })
    ));
    store
        .add(
            ItemTemplate::new("potion", "Potion", ItemType::Decoration).consumable(true),
            1,
        )
        .unwrap();
    assert!(store.use_item("potion", 1).unwrap().removed_all);
}

#[test]
fn add_then_full_remove_restores_previous_items() {
    let mut store = ItemStore::new(10);
    store.add(resource("wood"), 2).unwrap();
    let before = store.snapshot();

    store.add(resource("stone"), 6).unwrap();
    let removed = store.remove("stone", Some(6)).unwrap();
    assert!(removed.removed_all);
    assert_eq!(removed.quantity_removed, 6);
    assert_eq!(store.snapshot(), before);
}

#[test]
fn failed_craft_leaves_store_unchanged() {
    let mut store = ItemStore::new(10);
    store.add(resource("wood"), 1).unwrap();
    let before = store.snapshot();

    let recipe = Recipe::new(ItemTemplate::new("axe", "Axe", ItemType::Tool))
        .with_material("wood", 2)
        .with_material("stone", 1);
    let err = craft(&mut store, &recipe, 1).unwrap_err();
    match err {
        InventoryError::InsufficientMaterial {
            item_id,
            required,
            available,
        } => {
            assert_eq!(item_id, "wood");
            assert_eq!(required, 2);
            assert_eq!(available, 1);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(store.snapshot(), before);
    assert!(!store.contains("axe"));
}

#[test]
fn craft_at_capacity_consumes_nothing() {
    let mut store = ItemStore::new(2);
    store.add(resource("wood"), 5).unwrap();
    store.add(resource("stone"), 5).unwrap();
    let before = store.snapshot();

    let recipe = Recipe::new(ItemTemplate::new("axe", "Axe", ItemType::Tool))
        .with_material("wood", 2)
        .with_material("stone", 1);
    assert!(matches!(
        craft(&mut store, &recipe, 1),
        Err(InventoryError::CapacityExceeded { .. })
    ));
    assert_eq!(store.snapshot(), before);
}

#[test]
fn craft_multiplies_materials_and_result() {
    let mut store = ItemStore::new(10);
    store.add(resource("wood"), 6).unwrap();
    store.add(resource("stone"), 3).unwrap();
    let recipe = Recipe::new(resource("plank"))
        .with_material("wood", 2)
        .yielding(4);

    let outcome = craft(&mut store, &recipe, 3).unwrap();
    assert_eq!(outcome.produced.record.quantity, 12);
    assert!(!store.contains("wood"));
    assert_eq!(store.quantity_of("stone"), 3);
}

#[test]
fn upgrade_raises_level_and_efficiency() {
    let mut store = ItemStore::new(10);
    store
        .add(
            ItemTemplate::new("hoe", "Hoe", ItemType::Tool)
                .with_attribute("level", 2)
                .with_attribute("efficiency", 1.5),
            1,
        )
        .unwrap();
    store.add(resource("iron"), 3).unwrap();

    let outcome = upgrade_tool(&mut store, "hoe", &[RecipeMaterial::new("iron", 2)]).unwrap();
    assert_eq!(outcome.tool.attribute("level"), Some(&json!(3)));
    let efficiency = outcome
        .tool
        .attribute("efficiency")
        .and_then(|v| v.as_f64())
        .unwrap();
    assert!((efficiency - 1.8).abs() < 1e-9);
    assert_eq!(store.quantity_of("iron"), 1);

    let before = store.snapshot();
    assert!(matches!(
        upgrade_tool(&mut store, "hoe", &[RecipeMaterial::new("iron", 2)]),
        Err(InventoryError::InsufficientMaterial { .. })
    ));
    assert_eq!(store.snapshot(), before);
}

#[test]
fn upgrade_requires_a_tool() {
    let mut store = ItemStore::new(10);
    store.add(resource("iron"), 3).unwrap();
    assert!(matches!(
        upgrade_tool(&mut store, "iron", &[]),
        Err(InventoryError::InvalidTool(_))
    ));
    assert!(matches!(
        upgrade_tool(&mut store, "sickle", &[]),
        Err(InventoryError::NotFound(_))
    ));
}

#[test]
fn planting_returns_growth_metadata() {
    let mut store = ItemStore::new(10);
    store
        .add(
            ItemTemplate::new("seed-1", "Carrot Seed", ItemType::Seed)
                .with_attribute("plantType", "carrot")
                .with_attribute("growthTime", 300),
            2,
        )
        .unwrap();
    let planted = plant_seed(&mut store, "seed-1").unwrap();
    assert_eq!(planted.plant_type, Some(json!("carrot")));
    assert_eq!(planted.growth_time, Some(json!(300)));
    assert_eq!(planted.remaining, 1);

    store.add(resource("wood"), 1).unwrap();
    assert!(matches!(
        plant_seed(&mut store, "wood"),
        Err(InventoryError::InvalidSeed(_))
    ));
}

#[test]
fn snapshot_restore_round_trip() {
    let mut store = ItemStore::new(10);
    store.add(resource("wood"), 4).unwrap();
    store
        .add(
            ItemTemplate::new("gnome", "Gnome", ItemType::Decoration).with_category("garden"),
            1,
        )
        .unwrap();
    let snapshot = store.snapshot();

    let mut other = ItemStore::new(10);
    other.add(resource("junk"), 1).unwrap();
    other.restore(snapshot.clone()).unwrap();
    assert_eq!(other.snapshot(), snapshot);
    assert!(!other.contains("junk"));
    assert_eq!(other.list_by_category("garden").len(), 1);
}
