//! The async listener loop processes scripted host messages in order.
use portals_inventory::config::InventoryConfig;
use portals_inventory::engine::InventoryEngine;
use portals_inventory::persistence::MemoryStorage;
use portals_inventory::protocol::{LoggingTransport, RecordingTransport, TargetState};

#[tokio::test]
async fn processes_messages_in_arrival_order() {
    let transport = RecordingTransport::new().with_inbound([
        r#"{"action":"add","item":{"id":"seed-1","name":"Carrot Seed","type":"seed","plantType":"carrot","growthTime":120},"quantity":3}"#,
        "definitely not json",
        r#"{"action":"water","itemId":"seed-1"}"#,
        r#"{"action":"useItem","itemId":"seed-1","quantity":2}"#,
        r#"{"action":"plant","itemId":"seed-1"}"#,
        r#"{"action":"plant","itemId":"seed-1"}"#,
    ]);
    let storage = MemoryStorage::new();
    let engine = InventoryEngine::new(
        &InventoryConfig::default(),
        Box::new(storage.clone()),
        Box::new(transport.clone()),
    );

    let engine = engine.run().await;

    let sent = transport.notifications();
    let summary: Vec<(&str, TargetState)> = sent
        .iter()
        .map(|n| (n.task_name.as_str(), n.target_state))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("inventory_add_seed-1", TargetState::SetNotActiveToCompleted),
            ("inventory_use_seed-1", TargetState::SetActiveToCompleted),
            ("inventory_plant_seed-1", TargetState::SetActiveToCompleted),
            ("inventory_plant_seed-1", TargetState::SetActiveToNotActive),
        ]
    );
    assert_eq!(
        sent[3].error.as_ref().map(|e| e.kind.as_str()),
        Some("NotFound")
    );
    assert!(engine.store().is_empty());

    let blob = storage.peek("portals_inventory").expect("flushed blob");
    assert!(blob.contains("\"itemCount\": 0"));
}

#[tokio::test]
async fn logging_transport_returns_immediately() {
    let engine = InventoryEngine::new(
        &InventoryConfig::default(),
        Box::new(MemoryStorage::new()),
        Box::new(LoggingTransport),
    );
    let engine = engine.run().await;
    assert!(engine.store().is_empty());
}
