use log::debug;

use super::transport::Transport;
use super::Notification;

/// Formats outbound events under the configured task prefix and hands them to the transport.
pub struct NotificationEmitter {
    prefix: String,
    transport: Box<dyn Transport>,
}

impl NotificationEmitter {
    pub fn new(prefix: &str, transport: Box<dyn Transport>) -> Self {
        Self {
            prefix: prefix.to_string(),
            transport,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn transport_mut(&mut self) -> &mut dyn Transport {
        self.transport.as_mut()
    }

    pub fn emit(&mut self, notification: &Notification) {
        debug!(
            "emit {} -> {}",
            notification.task_name, notification.target_state
        );
        self.transport.send_notification(notification);
    }
}
