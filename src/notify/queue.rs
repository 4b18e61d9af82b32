//! Mutex-guarded FIFO queue for deferred notifications.
//!
//! Flushing swaps the whole queue out under the lock (`drain_all`) so a
//! concurrent append can never be lost or delivered twice; a failed send
//! puts the snapshot back at the front (`restore`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::alerts::ClassifiedAlert;
use crate::notify::router::DeliveryChannel;

/// An alert awaiting delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedNotification {
    pub alert: ClassifiedAlert,
    pub queued_at: DateTime<Utc>,
    pub channel: DeliveryChannel,
}

/// FIFO alert queue shared by concurrent event-handling paths.
#[derive(Debug, Default)]
pub struct AlertQueue {
    items: Mutex<Vec<QueuedNotification>>,
}

impl AlertQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, alert: ClassifiedAlert, channel: DeliveryChannel) {
        self.items.lock().await.push(QueuedNotification {
            alert,
            queued_at: Utc::now(),
            channel,
        });
    }

    /// Atomically take everything, leaving the queue empty.
    pub async fn drain_all(&self) -> Vec<QueuedNotification> {
        std::mem::take(&mut *self.items.lock().await)
    }

    /// Put a drained snapshot back at the front, ahead of anything
    /// appended since the drain.
    pub async fn restore(&self, mut snapshot: Vec<QueuedNotification>) {
        let mut items = self.items.lock().await;
        snapshot.append(&mut items);
        *items = snapshot;
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertLevel, AlertSource};

    fn make_alert(title: &str) -> ClassifiedAlert {
        ClassifiedAlert {
            level: AlertLevel::P2,
            title: title.into(),
            body: "body".into(),
            source: AlertSource::Email,
            source_id: "m-1".into(),
            signals: vec![],
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn drain_empties_the_queue() {
        let queue = AlertQueue::new();
        queue.push(make_alert("a"), DeliveryChannel::Batch).await;
        queue.push(make_alert("b"), DeliveryChannel::Batch).await;

        let drained = queue.drain_all().await;
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].alert.title, "a");
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn restore_puts_snapshot_ahead_of_new_items() {
        let queue = AlertQueue::new();
        queue.push(make_alert("old"), DeliveryChannel::Batch).await;

        let snapshot = queue.drain_all().await;
        queue.push(make_alert("new"), DeliveryChannel::Batch).await;
        queue.restore(snapshot).await;

        let all = queue.drain_all().await;
        assert_eq!(all[0].alert.title, "old");
        assert_eq!(all[1].alert.title, "new");
    }
}
