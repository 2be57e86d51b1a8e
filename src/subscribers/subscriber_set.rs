//! # SubscriberSet: fan-out of bus events to subscribers.
//!
//! Each subscriber gets its own bounded lane and worker task, so a slow or
//! panicking subscriber never holds up the publisher or its neighbours.
//!
//! ```text
//! emit(event) ──► lane 1 (bounded) ──► deliver ──► sub1.on_event()
//!             └─► lane N (bounded) ──► deliver ──► subN.on_event()
//!                      │                  └─ panic ──► SubscriberPanicked
//!                      └─ full / closed ──► SubscriberOverflow
//! ```
//!
//! Events reach one subscriber in publish order; there is no ordering across
//! subscribers. `AssertUnwindSafe` wraps `on_event`, so a subscriber that panics
//! while holding a lock may leave its own state poisoned.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::panic_message;
use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

/// Bounded queue in front of one subscriber.
struct Lane {
    subscriber: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
}

impl Lane {
    /// Queues `event`, or returns the overflow event to report instead.
    fn offer(&self, event: &Arc<Event>) -> Option<Event> {
        self.queue
            .try_send(Arc::clone(event))
            .err()
            .map(|err| Event::undelivered(self.subscriber, &err))
    }
}

/// Fan-out of bus events to every registered subscriber.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (lanes, workers): (Vec<Lane>, Vec<JoinHandle<()>>) = subs
            .into_iter()
            .map(|sub| {
                let (queue, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let lane = Lane {
                    subscriber: sub.name(),
                    queue,
                };
                (lane, tokio::spawn(deliver(sub, rx, bus.clone())))
            })
            .unzip();

        Self {
            lanes,
            workers,
            bus,
        }
    }

    /// Returns `true` if the set has no subscribers.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: Event) {
        self.emit_arc(Arc::new(event));
    }

    /// Emits a shared event to all subscribers.
    ///
    /// A subscriber whose queue is full or closed misses the event and a
    /// `SubscriberOverflow` is published for it. Overflow events that overflow
    /// themselves are not reported again.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let report = !event.is_subscriber_overflow();
        for overflow in self.lanes.iter().filter_map(|lane| lane.offer(&event)) {
            if report {
                self.bus.publish(overflow);
            }
        }
    }

    /// Closes every lane and waits until each worker has delivered what was
    /// already queued.
    pub async fn shutdown(self) {
        drop(self.lanes);

        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Worker loop of one subscriber; a panic in `on_event` is reported and the
/// loop moves on to the next event.
async fn deliver(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let handled = AssertUnwindSafe(sub.on_event(ev.as_ref()))
            .catch_unwind()
            .await;
        if let Err(payload) = handled {
            bus.publish(Event::subscriber_panicked(sub.name(), panic_message(payload)));
        }
    }
}
