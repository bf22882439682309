use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    constants::NOTIFICATION_CAPACITY,
    models::{Notification, NotificationType},
};

/// In-memory notification feed, newest first.
#[derive(Clone, Default)]
pub struct NotificationCenter {
    items: Arc<RwLock<VecDeque<Notification>>>,
    last_id: Arc<AtomicU64>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    // Millisecond timestamps, bumped when two notifications land in the same millisecond.
    fn next_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut current = self.last_id.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(current + 1);
            match self.last_id.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate.to_string(),
                Err(actual) => current = actual,
            }
        }
    }

    pub async fn push(
        &self,
        notif_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Notification {
        let notification = Notification {
            id: self.next_id(),
            title: title.into(),
            message: message.into(),
            notif_type,
            timestamp: chrono::Utc::now(),
            read: false,
        };

        tracing::info!(
            "Notification [{:?}] {} - {}",
            notification.notif_type,
            notification.title,
            notification.message
        );

        let mut items = self.items.write().await;
        items.push_front(notification.clone());
        items.truncate(NOTIFICATION_CAPACITY);
        notification
    }

    pub async fn list(&self) -> Vec<Notification> {
        self.items.read().await.iter().cloned().collect()
    }

    pub async fn mark_read(&self, id: &str) -> bool {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    pub async fn mark_all_read(&self) {
        for n in self.items.write().await.iter_mut() {
            n.read = true;
        }
    }

    /// Drops every notification and returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut items = self.items.write().await;
        let removed = items.len();
        items.clear();
        removed
    }

    pub async fn unread_count(&self) -> usize {
        self.items.read().await.iter().filter(|n| !n.read).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn newest_first_with_unique_ids() {
        let center = NotificationCenter::new();
        let first = center.push(NotificationType::Info, "a", "first").await;
        let second = center.push(NotificationType::Success, "b", "second").await;
        assert_ne!(first.id, second.id);

        let list = center.list().await;
        assert_eq!(list[0].title, "b");
        assert_eq!(center.unread_count().await, 2);
    }

    #[tokio::test]
    async fn mark_read_updates_counts() {
        let center = NotificationCenter::new();
        let n = center.push(NotificationType::Warning, "due", "soon").await;
        center.push(NotificationType::Error, "failed", "oops").await;

        assert!(center.mark_read(&n.id).await);
        assert!(!center.mark_read("nope").await);
        assert_eq!(center.unread_count().await, 1);

        center.mark_all_read().await;
        assert_eq!(center.unread_count().await, 0);
    }

    #[tokio::test]
    async fn clear_empties_the_feed() {
        let center = NotificationCenter::new();
        center.push(NotificationType::Info, "a", "first").await;
        center.push(NotificationType::Warning, "b", "second").await;

        assert_eq!(center.clear().await, 2);
        assert!(center.list().await.is_empty());
        assert_eq!(center.unread_count().await, 0);

        let next = center.push(NotificationType::Info, "c", "third").await;
        assert_eq!(center.list().await[0].id, next.id);
    }

    #[tokio::test]
    async fn feed_is_capped() {
        let center = NotificationCenter::new();
        for i in 0..(NOTIFICATION_CAPACITY + 5) {
            center.push(NotificationType::Info, "n", i.to_string()).await;
        }
        assert_eq!(center.list().await.len(), NOTIFICATION_CAPACITY);
    }
}
