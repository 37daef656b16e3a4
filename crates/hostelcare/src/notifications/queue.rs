use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{Notification, NotificationError, NotificationSender};

/// Fire-and-forget front for a blocking transport. `send` only enqueues; a
/// background task drains the queue and hands each message to the
/// transport on the blocking pool.
#[derive(Clone)]
pub struct QueuedNotifier {
    queue: mpsc::UnboundedSender<Notification>,
}

impl QueuedNotifier {
    /// Must be called inside a tokio runtime. The returned task finishes once
    /// every clone of the notifier has been dropped and the queue is empty.
    pub fn spawn<T>(transport: Arc<T>) -> (Self, JoinHandle<()>)
    where
        T: NotificationSender + 'static,
    {
        let (queue, mut inbox) = mpsc::unbounded_channel::<Notification>();

        let worker = tokio::spawn(async move {
            while let Some(notification) = inbox.recv().await {
                let transport = Arc::clone(&transport);
                let recipient = notification.recipient_email.clone();
                let outcome =
                    tokio::task::spawn_blocking(move || transport.send(notification)).await;

                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => warn!(%recipient, error = %err, "notification delivery failed"),
                    Err(join) => warn!(%recipient, error = %join, "notification task panicked"),
                }
            }
            info!("notification queue drained");
        });

        (Self { queue }, worker)
    }
}

impl NotificationSender for QueuedNotifier {
    fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        self.queue
            .send(notification)
            .map_err(|_| NotificationError::QueueClosed)
    }
}
