//! # Command Dispatcher
//!
//! Routes decoded host commands to item store and resolver operations through
//! an action table. The farming table adds planting, harvesting, tool upgrades
//! and crafting on top of the base inventory table and falls through to it for
//! everything else.
//!
//! The dispatcher owns no state. It borrows the [`InventoryState`] for the
//! length of one command and turns every failure into a failure notification,
//! so nothing raised by the store ever reaches the transport loop.

pub mod handlers;
pub mod payload;

use std::collections::HashMap;

use log::{debug, warn};
use serde_json::Value;

use crate::inventory::{InventoryError, ItemStore, PortalsVariables};
use crate::logutil::{escape_log, payload_preview};
use crate::protocol::{Action, InboundMessage, Notification, TargetState};
pub use payload::Payload;

/// Everything a command handler may touch.
#[derive(Debug, Default)]
pub struct InventoryState {
    pub store: ItemStore,
    pub variables: PortalsVariables,
}

impl InventoryState {
    pub fn new(max_slots: usize) -> Self {
        Self {
            store: ItemStore::new(max_slots),
            variables: PortalsVariables::new(),
        }
    }
}

/// What a handler reports back on success.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub target_state: TargetState,
    pub item_id: Option<String>,
    pub target_id: Option<String>,
    /// Store content changed and must be flushed.
    pub mutated: bool,
    pub data: Option<Value>,
}

impl ActionOutcome {
    pub fn mutation(target_state: TargetState, item_id: Option<String>) -> Self {
        Self {
            target_state,
            item_id,
            target_id: None,
            mutated: true,
            data: None,
        }
    }

    pub fn query(target_state: TargetState, item_id: Option<String>) -> Self {
        Self {
            mutated: false,
            ..Self::mutation(target_state, item_id)
        }
    }

    pub fn with_target(mut self, target_id: &str) -> Self {
        self.target_id = Some(target_id.to_string());
        self
    }

    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }
}

pub type Handler = fn(&mut InventoryState, &Payload) -> Result<ActionOutcome, InventoryError>;

/// Action name to handler mapping with an optional table consulted on a miss.
pub struct ActionTable {
    name: &'static str,
    handlers: HashMap<Action, Handler>,
    fallback: Option<Box<ActionTable>>,
}

impl ActionTable {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: HashMap::new(),
            fallback: None,
        }
    }

    pub fn with(mut self, action: Action, handler: Handler) -> Self {
        self.handlers.insert(action, handler);
        self
    }

    pub fn falling_back_to(mut self, fallback: ActionTable) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Own entry first, then the fallback chain.
    pub fn lookup(&self, action: Action) -> Option<Handler> {
        match self.handlers.get(&action) {
            Some(handler) => Some(*handler),
            None => self.fallback.as_ref().and_then(|t| t.lookup(action)),
        }
    }

    /// Plain inventory operations.
    pub fn base() -> Self {
        ActionTable::new("inventory")
            .with(Action::Add, handlers::add)
            .with(Action::Remove, handlers::remove)
            .with(Action::Get, handlers::get)
            .with(Action::Update, handlers::update)
            .with(Action::Use, handlers::use_item)
            .with(Action::Transfer, handlers::transfer)
            .with(Action::Clear, handlers::clear)
            .with(Action::ListByCategory, handlers::list_by_category)
            .with(Action::SyncVariable, handlers::sync_variable)
    }

    /// Farming operations layered over [`ActionTable::base`].
    pub fn farming() -> Self {
        ActionTable::new("farming")
            .with(Action::Plant, handlers::plant)
            .with(Action::Harvest, handlers::harvest)
            .with(Action::Upgrade, handlers::upgrade)
            .with(Action::Craft, handlers::craft)
            .falling_back_to(ActionTable::base())
    }
}

/// Result of routing one command.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub notification: Notification,
    pub mutated: bool,
}

pub struct Dispatcher {
    table: ActionTable,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(ActionTable::farming())
    }
}

impl Dispatcher {
    pub fn new(table: ActionTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    /// Run one command. `None` means the action is unknown and was dropped.
    pub fn dispatch(
        &self,
        state: &mut InventoryState,
        prefix: &str,
        message: &InboundMessage,
    ) -> Option<Dispatched> {
        let Some(action) = Action::parse(&message.action) else {
            debug!("ignoring unknown action '{}'", escape_log(&message.action));
            return None;
        };
        let Some(handler) = self.table.lookup(action) else {
            debug!("action {} not handled by {} table", action, self.table.name);
            return None;
        };

        if log::log_enabled!(log::Level::Debug) {
            let fields = Value::Object(message.payload.clone());
            debug!("dispatch {} {}", action, payload_preview(&fields));
        }
        let payload = Payload::new(&message.payload);
        let dispatched = match handler(state, &payload) {
            Ok(outcome) => Dispatched {
                notification: Notification::new(
                    prefix,
                    action.as_str(),
                    outcome.item_id.as_deref(),
                    outcome.target_state,
                )
                .with_target(outcome.target_id)
                .with_data(outcome.data),
                mutated: outcome.mutated,
            },
            Err(err) => {
                warn!("{} failed: {}", action, err);
                let target = payload
                    .get("targetId")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Dispatched {
                    notification: Notification::failure(
                        prefix,
                        action.as_str(),
                        payload.id_hint(),
                        &err,
                    )
                    .with_target(target),
                    mutated: false,
                }
            }
        };
        Some(dispatched)
    }
}
