use crate::domain::notification::Notification;
use crate::domain::ports::NotificationPort;
use std::sync::{Arc, Mutex};

/// Writes every notification to the tracing pipeline.
///
/// Stands in for SMS, push or WhatsApp delivery, which live outside this crate.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl NotificationPort for TracingNotifier {
    fn notify(&self, notification: Notification) {
        tracing::info!(
            booking = %notification.booking_id,
            recipient = ?notification.recipient,
            kind = %notification.kind,
            payload = %notification.payload,
            "notification"
        );
    }
}

/// Keeps every notification in memory for later inspection.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in delivery order.
    pub fn sent(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationPort for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        match self.sent.lock() {
            Ok(mut sent) => sent.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}
