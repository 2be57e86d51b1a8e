//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (coordinator, generations,
//! subscriber workers).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                   Subscriber (one):
//!   Coordinator   ──┐
//!   Generation 0  ──┼────► Bus ───────► listener ────► SubscriberSet
//!   Generation N  ──┤  (broadcast chan)  (in Coordinator)
//!   Sub workers   ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Sequencing**: every published event gets the next sequence number of this bus.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active subscribers at send time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: clones share the channel and the sequence counter.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
    seq: Arc<AtomicU64>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stamps the event with the next sequence number and publishes it.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, mut ev: Event) {
        ev.seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn sequence_numbers_are_per_bus_and_increasing() {
        let a = Bus::new(8);
        let b = Bus::new(8);
        let mut rx_a = a.subscribe();
        let mut rx_b = b.subscribe();

        a.publish(Event::new(EventKind::ShutdownRequested));
        a.clone().publish(Event::new(EventKind::CoordinatorClosed));
        b.publish(Event::new(EventKind::ShutdownRequested));

        assert_eq!(rx_a.recv().await.unwrap().seq, 1);
        assert_eq!(rx_a.recv().await.unwrap().seq, 2);
        assert_eq!(rx_b.recv().await.unwrap().seq, 1);
    }

    #[tokio::test]
    async fn publish_without_receivers_is_fine() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::ShutdownRequested));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::CoordinatorClosed));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::CoordinatorClosed);
        assert_eq!(ev.seq, 2);
    }
}
