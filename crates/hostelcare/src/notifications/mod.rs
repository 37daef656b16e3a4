//! Outbound mail on lifecycle events. Delivery is best effort: a failed send
//! is logged and never undoes the transition that triggered it.

mod queue;
pub mod templates;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use queue::QueuedNotifier;

/// One rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient_email: String,
    pub subject: String,
    pub body_html: String,
}

/// Transport seam for mail delivery (SMTP relay, provider API, queue...).
pub trait NotificationSender: Send + Sync {
    fn send(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification queue is closed")]
    QueueClosed,
}

/// Hand each notification to `sender`, logging failures instead of
/// returning them.
pub(crate) fn dispatch<N>(sender: &N, notifications: Vec<Notification>)
where
    N: NotificationSender + ?Sized,
{
    for notification in notifications {
        let recipient = notification.recipient_email.clone();
        let subject = notification.subject.clone();
        match sender.send(notification) {
            Ok(()) => debug!(%recipient, %subject, "notification handed off"),
            Err(err) => warn!(%recipient, %subject, error = %err, "notification dropped"),
        }
    }
}

/// In-process outbox that keeps every message it is given.
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryOutbox {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<Notification> {
        self.sent
            .lock()
            .iter()
            .filter(|notification| notification.recipient_email == recipient)
            .cloned()
            .collect()
    }
}

impl NotificationSender for MemoryOutbox {
    fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent.lock().push(notification);
        Ok(())
    }
}
