// Event Bus - per-subject pub/sub for listener notifications
//
// Each subject id (session or agent) has its own list of subscriber
// channels plus a small ring buffer of recent messages so a reconnecting
// listener can catch up on what it missed. Best-effort only: a subscriber
// that stops draining its queue loses messages, and nothing here survives
// a restart.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::BusConfig;
use crate::domain::Notification;

#[derive(Default)]
struct Subject {
    ring: Mutex<VecDeque<Notification>>,
    subscribers: Mutex<Vec<SubscriberSlot>>,
}

struct SubscriberSlot {
    id: u64,
    tx: mpsc::Sender<Notification>,
}

/// Handle for one attached listener. Owned by the listener until
/// unsubscribed; messages arrive in publish order.
pub struct Subscription {
    id: u64,
    subject_id: String,
    rx: mpsc::Receiver<Notification>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Wait for the next message. Returns `None` once the subscription has
    /// been removed from the bus and the queue is drained.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }
}

/// Per-subject publish/subscribe channel with replay-on-reconnect history.
pub struct EventBus {
    subjects: DashMap<String, Subject>,
    next_subscriber_id: AtomicU64,
    config: BusConfig,
}

impl EventBus {
    pub fn new(config: BusConfig) -> Self {
        Self {
            subjects: DashMap::new(),
            next_subscriber_id: AtomicU64::new(1),
            config,
        }
    }

    /// Register a new listener for `subject_id` and return its channel.
    pub fn subscribe(&self, subject_id: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(self.config.subscriber_capacity);
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let subject = self.subjects.entry(subject_id.to_string()).or_default();
        subject.subscribers.lock().push(SubscriberSlot { id, tx });
        Subscription {
            id,
            subject_id: subject_id.to_string(),
            rx,
        }
    }

    /// Remove a listener. Safe to call at any time, including while a
    /// publish to the same subject is in flight; other subscribers are
    /// unaffected.
    pub fn unsubscribe(&self, subject_id: &str, subscription_id: u64) {
        if let Some(subject) = self.subjects.get(subject_id) {
            subject
                .subscribers
                .lock()
                .retain(|slot| slot.id != subscription_id);
        }
    }

    /// Broadcast a message to every current subscriber of `subject_id`.
    ///
    /// Never blocks: the message lands in the subject's ring buffer
    /// (evicting the oldest entry past capacity) and is then offered to
    /// each subscriber queue. A full queue drops the message silently.
    pub fn publish(&self, subject_id: &str, message: Notification) {
        let subject = self.subjects.entry(subject_id.to_string()).or_default();

        {
            let mut ring = subject.ring.lock();
            ring.push_back(message.clone());
            while ring.len() > self.config.ring_capacity {
                ring.pop_front();
            }
        }

        let mut subscribers = subject.subscribers.lock();
        subscribers.retain(|slot| match slot.tx.try_send(message.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(subject_id, subscriber = slot.id, "subscriber queue full, dropping message");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    /// Buffered messages for a reconnecting listener, oldest first.
    pub fn recent(&self, subject_id: &str) -> Vec<Notification> {
        self.subjects
            .get(subject_id)
            .map(|subject| subject.ring.lock().iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self, subject_id: &str) -> usize {
        self.subjects
            .get(subject_id)
            .map(|subject| subject.subscribers.lock().len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}
