//! Ordered event emitter with sequence guarantees.
//!
//! Every envelope leaving the director carries a monotonically increasing
//! sequence number, so observers can check lifecycle ordering (a teardown
//! precedes the next initialize) even if they receive events late.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use events::{Event, EventBus, EventEnvelope};
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct OrderedEventEmitter {
    bus: EventBus,
    sequence: Arc<AtomicU64>,
}

impl OrderedEventEmitter {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event with the next sequence number.
    pub fn emit(&self, event: Event) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.bus
            .publish(EventEnvelope::new(event).with_sequence(sequence));
        sequence
    }

    /// Last sequence number handed out, 0 before the first event.
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.bus.subscribe()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

impl std::fmt::Debug for OrderedEventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedEventEmitter")
            .field("sequence", &self.current_sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_increments() {
        let emitter = OrderedEventEmitter::new(EventBus::new());
        assert_eq!(emitter.current_sequence(), 0);

        assert_eq!(emitter.emit(Event::PhaseRunning { phase: 1 }), 1);
        assert_eq!(emitter.emit(Event::PhaseCompleted { phase: 1 }), 2);
        assert_eq!(emitter.current_sequence(), 2);
    }

    #[test]
    fn test_clone_shares_sequence() {
        let emitter1 = OrderedEventEmitter::new(EventBus::new());
        let emitter2 = emitter1.clone();

        emitter1.emit(Event::ProgressReset);
        emitter2.emit(Event::ProgressImported);

        assert_eq!(emitter1.current_sequence(), 2);
        assert_eq!(emitter2.current_sequence(), 2);
    }

    #[tokio::test]
    async fn test_envelopes_carry_sequence() {
        let emitter = OrderedEventEmitter::new(EventBus::new());
        let mut rx = emitter.subscribe();

        emitter.emit(Event::PhaseTornDown { phase: 0 });
        emitter.emit(Event::PhaseInitializing { phase: 1 });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(second.event, Event::PhaseInitializing { phase: 1 });
    }
}
