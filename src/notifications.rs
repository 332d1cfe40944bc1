use crate::models::{now_ms, Notification, Severity};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const NOTIFICATION_TTL_MS: i64 = 5_000;
pub const DEFAULT_QUEUE_BOUND: usize = 64;

/// Bounded queue of transient user-facing messages. Items expire after the
/// TTL or on explicit dismissal; pushing past the bound evicts the oldest.
#[derive(Clone)]
pub struct NotificationQueue {
    inner: Arc<Mutex<VecDeque<Notification>>>,
    ttl_ms: i64,
    bound: usize,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::with_limits(NOTIFICATION_TTL_MS, DEFAULT_QUEUE_BOUND)
    }

    pub fn with_limits(ttl_ms: i64, bound: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            ttl_ms,
            bound: bound.max(1),
        }
    }

    pub fn push(&self, message: impl Into<String>, severity: Severity) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            message: message.into(),
            severity,
            created_at: now_ms(),
        };

        let mut queue = self.lock();
        queue.push_back(notification.clone());
        while queue.len() > self.bound {
            queue.pop_front();
        }
        notification
    }

    /// Live notifications, expired entries filtered out.
    pub fn active(&self) -> Vec<Notification> {
        let cutoff = now_ms() - self.ttl_ms;
        self.lock()
            .iter()
            .filter(|n| n.created_at > cutoff)
            .cloned()
            .collect()
    }

    /// Unknown ids are ignored.
    pub fn dismiss(&self, id: &str) {
        self.lock().retain(|n| n.id != id);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drops expired entries and reports how many were removed. Run
    /// periodically by the core's maintenance loop.
    pub fn sweep_expired(&self) -> usize {
        let cutoff = now_ms() - self.ttl_ms;
        let mut queue = self.lock();
        let before = queue.len();
        queue.retain(|n| n.created_at > cutoff);
        before - queue.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notification>> {
        self.inner.lock().expect("notification queue lock")
    }
}
