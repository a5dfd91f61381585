//! Broadcast bus for lifecycle events.
//!
//! The director is the only publisher. Observers (the CLI event log, tests
//! checking ordering) subscribe and read at their own pace; one that falls
//! more than the channel capacity behind sees `RecvError::Lagged`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::types::{Event, EventEnvelope};

/// Enough for one full journey.
const DEFAULT_CAPACITY: usize = 256;

#[derive(Default)]
struct BusStats {
    published: AtomicU64,
    undelivered: AtomicU64,
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    stats: Arc<BusStats>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            stats: Arc::new(BusStats::default()),
        }
    }

    /// Hands `envelope` to every current subscriber.
    ///
    /// Publishing with nobody listening is normal; the envelope is counted
    /// as undelivered and dropped. Returns whether anyone received it.
    pub fn publish(&self, envelope: EventEnvelope) -> bool {
        self.stats.published.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(envelope) {
            Ok(_) => true,
            Err(_) => {
                self.stats.undelivered.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Publishes `event` in a fresh unsequenced envelope.
    pub fn publish_event(&self, event: Event) -> bool {
        self.publish(EventEnvelope::new(event))
    }

    /// Receives everything published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }

    pub fn published(&self) -> u64 {
        self.stats.published.load(Ordering::Relaxed)
    }

    /// Events published while nobody was subscribed.
    pub fn undelivered(&self) -> u64 {
        self.stats.undelivered.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .field("published", &self.published())
            .field("undelivered", &self.undelivered())
            .finish()
    }
}
