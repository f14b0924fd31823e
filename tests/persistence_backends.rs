//! Blob persistence through the on-disk backends.
use tempfile::TempDir;

use portals_inventory::config::{InventoryConfig, StorageBackendKind, StorageConfig};
use portals_inventory::engine::InventoryEngine;
use portals_inventory::inventory::{InventoryError, ItemStore, ItemTemplate, ItemType};
use portals_inventory::persistence::{
    open_backend, FileStorage, PersistenceGateway, SledStorage, StorageBackend,
};
use portals_inventory::protocol::LoggingTransport;

fn stocked() -> ItemStore {
    let mut store = ItemStore::new(10);
    store
        .add(
            ItemTemplate::new("seed-1", "Carrot Seed", ItemType::Seed)
                .with_attribute("plantType", "carrot"),
            3,
        )
        .unwrap();
    store
        .add(ItemTemplate::new("hoe", "Hoe", ItemType::Tool).with_attribute("level", 2), 1)
        .unwrap();
    store
}

fn round_trip(backend: Box<dyn StorageBackend>, reopen: impl FnOnce() -> Box<dyn StorageBackend>) {
    let original = stocked();
    {
        let mut gateway = PersistenceGateway::new(backend, "portals_inventory", true);
        gateway.flush(&original);
    }
    let mut gateway = PersistenceGateway::new(reopen(), "portals_inventory", true);
    let mut restored = ItemStore::new(10);
    assert_eq!(gateway.hydrate(&mut restored), 2);
    assert_eq!(restored.snapshot(), original.snapshot());
}

#[test]
fn file_backend_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().to_path_buf();
    round_trip(
        Box::new(FileStorage::new(&path).expect("file storage")),
        || -> Box<dyn StorageBackend> { Box::new(FileStorage::new(&path).expect("file storage")) },
    );
    assert!(dir.path().join("portals_inventory.json").exists());
}

#[test]
fn sled_backend_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let mut storage = SledStorage::open(dir.path().join("db")).expect("sled");
    let original = stocked();
    let blob = PersistenceGateway::export_json(&original).unwrap();
    storage.set("portals_inventory", &blob).unwrap();

    let mut gateway = PersistenceGateway::new(Box::new(storage), "portals_inventory", true);
    let mut restored = ItemStore::new(10);
    assert_eq!(gateway.load(&mut restored), 2);
    assert_eq!(restored.snapshot(), original.snapshot());
}

#[test]
fn blob_carries_metadata() {
    let blob = PersistenceGateway::export_json(&stocked()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
    assert_eq!(value["metadata"]["maxSlots"], 10);
    assert_eq!(value["metadata"]["itemCount"], 2);
    assert!(value["metadata"]["exportedAt"].is_string());
    assert_eq!(value["items"][0]["id"], "hoe");
    assert_eq!(value["items"][1]["plantType"], "carrot");
}

#[test]
fn import_rejects_bad_blobs() {
    let dir = TempDir::new().expect("tempdir");
    let mut gateway = PersistenceGateway::new(
        Box::new(FileStorage::new(dir.path()).unwrap()),
        "portals_inventory",
        true,
    );
    let mut store = stocked();
    let before = store.snapshot();
    for bad in [
        "not json",
        r#"{"metadata": {}}"#,
        r#"{"items": {"id": "x"}}"#,
        r#"{"items": [{"id": "x", "name": "X", "type": "seed", "quantity": 0}]}"#,
        r#"{"items": [{"id": "x", "name": "X", "type": "seed", "quantity": 1},
                      {"id": "x", "name": "X", "type": "seed", "quantity": 2}]}"#,
    ] {
        assert!(
            matches!(
                gateway.import_json(&mut store, bad),
                Err(InventoryError::InvalidImportData(_))
            ),
            "{}",
            bad
        );
    }
    assert_eq!(store.snapshot(), before);
}

#[test]
fn import_over_capacity_is_rejected() {
    let mut gateway = PersistenceGateway::new(
        open_backend(&StorageConfig {
            backend: StorageBackendKind::Memory,
            data_dir: String::new(),
        })
        .unwrap(),
        "portals_inventory",
        true,
    );
    let blob = PersistenceGateway::export_json(&stocked()).unwrap();
    let mut small = ItemStore::new(1);
    assert!(matches!(
        gateway.import_json(&mut small, &blob),
        Err(InventoryError::InvalidImportData(_))
    ));
    assert!(small.is_empty());
}

#[test]
fn engine_survives_restart_on_file_backend() {
    let dir = TempDir::new().expect("tempdir");
    let storage = StorageConfig {
        backend: StorageBackendKind::File,
        data_dir: dir.path().to_string_lossy().into_owned(),
    };
    let config = InventoryConfig::default();
    {
        let mut engine = InventoryEngine::new(
            &config,
            open_backend(&storage).unwrap(),
            Box::new(LoggingTransport),
        );
        engine.handle_raw(
            r#"{"action":"add","item":{"id":"pumpkin","name":"Pumpkin","type":"plant"},"quantity":7}"#,
        );
        engine.handle_raw(r#"{"action":"remove","itemId":"pumpkin","quantity":2}"#);
    }
    let engine = InventoryEngine::new(
        &config,
        open_backend(&storage).unwrap(),
        Box::new(LoggingTransport),
    );
    assert_eq!(engine.store().quantity_of("pumpkin"), 5);
}

#[test]
fn auto_save_off_neither_reads_nor_writes() {
    let dir = TempDir::new().expect("tempdir");
    let storage = StorageConfig {
        backend: StorageBackendKind::File,
        data_dir: dir.path().to_string_lossy().into_owned(),
    };
    let config = InventoryConfig {
        auto_save: false,
        ..InventoryConfig::default()
    };
    let mut engine = InventoryEngine::new(
        &config,
        open_backend(&storage).unwrap(),
        Box::new(LoggingTransport),
    );
    engine.handle_raw(r#"{"action":"add","item":{"id":"a","name":"A","type":"resource"}}"#);
    assert!(!dir.path().join("portals_inventory.json").exists());
}

#[test]
fn smaller_store_keeps_saved_inventory_intact() {
    let dir = TempDir::new().expect("tempdir");
    let storage = StorageConfig {
        backend: StorageBackendKind::File,
        data_dir: dir.path().to_string_lossy().into_owned(),
    };
    let mut saved = ItemStore::new(10);
    for id in ["a", "b", "c"] {
        saved
            .add(ItemTemplate::new(id, id, ItemType::Resource), 1)
            .unwrap();
    }
    let blob = PersistenceGateway::export_json(&saved).unwrap();
    open_backend(&storage)
        .unwrap()
        .set("portals_inventory", &blob)
        .unwrap();

    let config = InventoryConfig {
        max_slots: 2,
        ..InventoryConfig::default()
    };
    let mut engine = InventoryEngine::new(
        &config,
        open_backend(&storage).unwrap(),
        Box::new(LoggingTransport),
    );
    assert!(engine.store().is_empty());
    assert!(engine.persistence().is_guarded());

    let n = engine
        .handle_raw(r#"{"action":"add","item":{"id":"d","name":"D","type":"resource"}}"#)
        .unwrap();
    assert!(!n.is_failure());

    let on_disk = std::fs::read_to_string(dir.path().join("portals_inventory.json")).unwrap();
    assert_eq!(on_disk, blob);
}
