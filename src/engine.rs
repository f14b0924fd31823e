//! Engine wiring and the listener loop.
//!
//! For each inbound message the order is fixed: dispatch (validate, mutate),
//! flush if the store changed, then emit the notification. Messages are
//! processed one at a time in arrival order.

use log::{debug, info, trace, warn};
use tokio::sync::mpsc;

use crate::config::InventoryConfig;
use crate::dispatch::{Dispatcher, InventoryState};
use crate::inventory::{ItemStore, PortalsVariables};
use crate::logutil::escape_log;
use crate::persistence::{PersistenceGateway, StorageBackend};
use crate::protocol::{InboundMessage, Notification, NotificationEmitter, Transport};

pub struct InventoryEngine {
    state: InventoryState,
    dispatcher: Dispatcher,
    persistence: PersistenceGateway,
    emitter: NotificationEmitter,
}

impl InventoryEngine {
    /// Build an engine and hydrate it from the backend.
    pub fn new(
        config: &InventoryConfig,
        backend: Box<dyn StorageBackend>,
        transport: Box<dyn Transport>,
    ) -> Self {
        let mut state = InventoryState::new(config.max_slots);
        let mut persistence =
            PersistenceGateway::new(backend, &config.storage_key, config.auto_save);
        let restored = persistence.hydrate(&mut state.store);
        info!(
            "inventory engine ready: {}/{} slots used, prefix '{}'",
            restored, config.max_slots, config.task_prefix
        );
        Self {
            state,
            dispatcher: Dispatcher::default(),
            persistence,
            emitter: NotificationEmitter::new(&config.task_prefix, transport),
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn store(&self) -> &ItemStore {
        &self.state.store
    }

    pub fn variables(&self) -> &PortalsVariables {
        &self.state.variables
    }

    pub fn persistence(&self) -> &PersistenceGateway {
        &self.persistence
    }

    /// Decode and handle a raw payload. Malformed input is logged and dropped.
    pub fn handle_raw(&mut self, raw: &str) -> Option<Notification> {
        trace!("inbound {}", escape_log(raw));
        match InboundMessage::decode(raw) {
            Ok(message) => self.handle(&message),
            Err(e) => {
                warn!("dropping malformed message ({}): {}", e, escape_log(raw));
                None
            }
        }
    }

    pub fn handle(&mut self, message: &InboundMessage) -> Option<Notification> {
        let dispatched =
            self.dispatcher
                .dispatch(&mut self.state, self.emitter.prefix(), message)?;
        if dispatched.mutated {
            self.persistence.flush(&self.state.store);
        }
        self.emitter.emit(&dispatched.notification);
        Some(dispatched.notification)
    }

    /// Register with the transport and process messages until it closes the handler.
    pub async fn run(mut self) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        self.emitter.transport_mut().on_message(tx);
        let mut handled = 0usize;
        while let Some(raw) = rx.recv().await {
            if self.handle_raw(&raw).is_some() {
                handled += 1;
            }
        }
        debug!("transport closed after {} handled messages", handled);
        self
    }
}
