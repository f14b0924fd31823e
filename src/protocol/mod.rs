//! Host message protocol: inbound commands, outbound notifications and the
//! target-state tokens the host task system understands.
//!
//! Inbound messages are JSON objects with an `action` discriminator plus
//! action-specific fields. Outbound notifications carry a task name built as
//! `<prefix>_<action>[_<id>]` and one of five target-state tokens.

pub mod notify;
pub mod transport;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::inventory::InventoryError;

pub use notify::NotificationEmitter;
pub use transport::{LoggingTransport, MessageHandler, RecordingTransport, StdioTransport, Transport};

/// Host task transition: first word is the expected current state, second the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetState {
    SetNotActiveToActive,
    SetNotActiveToCompleted,
    SetActiveToActive,
    SetActiveToCompleted,
    SetActiveToNotActive,
}

impl TargetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetState::SetNotActiveToActive => "SetNotActiveToActive",
            TargetState::SetNotActiveToCompleted => "SetNotActiveToCompleted",
            TargetState::SetActiveToActive => "SetActiveToActive",
            TargetState::SetActiveToCompleted => "SetActiveToCompleted",
            TargetState::SetActiveToNotActive => "SetActiveToNotActive",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed inbound action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Add,
    Remove,
    Get,
    Update,
    Use,
    Transfer,
    Clear,
    ListByCategory,
    SyncVariable,
    Plant,
    Harvest,
    Upgrade,
    Craft,
}

impl Action {
    pub const ALL: [Action; 13] = [
        Action::Add,
        Action::Remove,
        Action::Get,
        Action::Update,
        Action::Use,
        Action::Transfer,
        Action::Clear,
        Action::ListByCategory,
        Action::SyncVariable,
        Action::Plant,
        Action::Harvest,
        Action::Upgrade,
        Action::Craft,
    ];

    /// Canonical wire name, also used inside task names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Remove => "remove",
            Action::Get => "get",
            Action::Update => "update",
            Action::Use => "use",
            Action::Transfer => "transfer",
            Action::Clear => "clear",
            Action::ListByCategory => "list-by-category",
            Action::SyncVariable => "sync-variable",
            Action::Plant => "plant",
            Action::Harvest => "harvest",
            Action::Upgrade => "upgrade",
            Action::Craft => "craft",
        }
    }

    /// Parse a canonical name or one of the host SDK's camelCase verbs.
    pub fn parse(name: &str) -> Option<Action> {
        let action = match name {
            "add" | "addItem" => Action::Add,
            "remove" | "removeItem" => Action::Remove,
            "get" | "getItem" => Action::Get,
            "update" | "updateItem" => Action::Update,
            "use" | "useItem" => Action::Use,
            "transfer" | "transferItem" => Action::Transfer,
            "clear" | "clearInventory" => Action::Clear,
            "list-by-category" | "getItemsByCategory" => Action::ListByCategory,
            "sync-variable" | "syncVariable" => Action::SyncVariable,
            "plant" | "plantSeed" => Action::Plant,
            "harvest" | "harvestPlant" => Action::Harvest,
            "upgrade" | "upgradeTool" => Action::Upgrade,
            "craft" | "craftItem" => Action::Craft,
            _ => return None,
        };
        Some(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw inbound command as decoded from the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundMessage {
    pub action: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl InboundMessage {
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub kind: String,
    pub message: String,
}

impl From<&InventoryError> for FailureDetail {
    fn from(err: &InventoryError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Outbound event sent to the host after every handled command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub task_name: String,
    pub target_state: TargetState,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// `<prefix>_<action>` with `_<id>` appended when an id is known.
pub fn task_name(prefix: &str, action: &str, id: Option<&str>) -> String {
    match id {
        Some(id) if !id.is_empty() => format!("{}_{}_{}", prefix, action, id),
        _ => format!("{}_{}", prefix, action),
    }
}

impl Notification {
    pub fn new(prefix: &str, action: &str, item_id: Option<&str>, target_state: TargetState) -> Self {
        Self {
            task_name: task_name(prefix, action, item_id),
            target_state,
            action: action.to_string(),
            item_id: item_id.map(str::to_string),
            target_id: None,
            error: None,
            data: None,
        }
    }

    pub fn failure(prefix: &str, action: &str, item_id: Option<&str>, err: &InventoryError) -> Self {
        let mut n = Self::new(prefix, action, item_id, err.target_state());
        n.error = Some(FailureDetail::from(err));
        n
    }

    pub fn with_target(mut self, target_id: Option<String>) -> Self {
        self.target_id = target_id;
        self
    }

    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_names() {
        assert_eq!(task_name("inventory", "add", Some("seed-1")), "inventory_add_seed-1");
        assert_eq!(task_name("inventory", "clear", None), "inventory_clear");
        assert_eq!(task_name("farm", "clear", Some("")), "farm_clear");
    }

    #[test]
    fn target_state_tokens_are_exact() {
        let encoded = serde_json::to_value(TargetState::SetActiveToNotActive).unwrap();
        assert_eq!(encoded, json!("SetActiveToNotActive"));
        assert_eq!(TargetState::SetNotActiveToCompleted.to_string(), "SetNotActiveToCompleted");
    }

    #[test]
    fn actions_parse_aliases() {
        assert_eq!(Action::parse("transferItem"), Some(Action::Transfer));
        assert_eq!(Action::parse("list-by-category"), Some(Action::ListByCategory));
        assert_eq!(Action::parse("dance"), None);
        for action in Action::ALL {
            assert_eq!(Action::parse(action.as_str()), Some(action));
        }
    }

    #[test]
    fn inbound_keeps_payload_fields() {
        let msg = InboundMessage::decode(r#"{"action":"use","itemId":"seed-1","quantity":2}"#)
            .unwrap();
        assert_eq!(msg.action, "use");
        assert_eq!(msg.payload.get("quantity"), Some(&json!(2)));
        assert!(InboundMessage::decode(r#"{"itemId":"x"}"#).is_err());
        assert!(InboundMessage::decode("not json").is_err());
    }

    #[test]
    fn failure_notification_shape() {
        let err = InventoryError::NotFound("gold".into());
        let n = Notification::failure("inventory", "remove", Some("gold"), &err);
        let v = serde_json::to_value(&n).unwrap();
        assert_eq!(v["taskName"], "inventory_remove_gold");
        assert_eq!(v["targetState"], "SetActiveToNotActive");
        assert_eq!(v["error"]["kind"], "NotFound");
        assert!(v.get("targetId").is_none());
    }
}
