//! Host transport collaborators.
//!
//! The engine only needs two capabilities from a host: deliver an outbound
//! notification, and register a handler that receives raw inbound payloads
//! in arrival order. Running without a host is just another transport.

use std::io::Write;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::Notification;
use crate::logutil::escape_log;

/// Sink the transport forwards raw inbound payloads into.
pub type MessageHandler = mpsc::UnboundedSender<String>;

pub trait Transport: Send {
    fn send_notification(&mut self, event: &Notification);

    /// Register the inbound handler. Dropping it signals end of input.
    fn on_message(&mut self, handler: MessageHandler);
}

/// Newline-delimited JSON over stdin/stdout.
#[derive(Debug, Default)]
pub struct StdioTransport;

impl StdioTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for StdioTransport {
    fn send_notification(&mut self, event: &Notification) {
        match serde_json::to_string(event) {
            Ok(line) => {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
                    warn!("failed to write notification {}: {}", event.task_name, e);
                }
            }
            Err(e) => warn!("failed to encode notification {}: {}", event.task_name, e),
        }
    }

    fn on_message(&mut self, handler: MessageHandler) {
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        if handler.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        warn!("stdin read failed: {}", e);
                        break;
                    }
                }
            }
        });
    }
}

/// No host attached: notifications are logged and nothing arrives.
#[derive(Debug, Default)]
pub struct LoggingTransport;

impl Transport for LoggingTransport {
    fn send_notification(&mut self, event: &Notification) {
        info!(
            "notification task={} state={}{}",
            event.task_name,
            event.target_state,
            event
                .error
                .as_ref()
                .map(|e| format!(" error={}", escape_log(&e.message)))
                .unwrap_or_default()
        );
    }

    fn on_message(&mut self, _handler: MessageHandler) {
        debug!("logging transport has no inbound source");
    }
}

/// Keeps every notification in a shared buffer and replays a scripted inbound queue.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Notification>>>,
    inbound: Vec<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads delivered, in order, once a handler is registered.
    pub fn with_inbound<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inbound = messages.into_iter().map(Into::into).collect();
        self
    }

    /// Shared handle to the recorded notifications.
    pub fn sent(&self) -> Arc<Mutex<Vec<Notification>>> {
        Arc::clone(&self.sent)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Transport for RecordingTransport {
    fn send_notification(&mut self, event: &Notification) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(event.clone());
        }
    }

    fn on_message(&mut self, handler: MessageHandler) {
        for message in self.inbound.drain(..) {
            if handler.send(message).is_err() {
                break;
            }
        }
    }
}
