//! # Runtime events emitted by the coordinator and its generations.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Generation events**: browser lifecycle of one generation
//! - **Task events**: execution flow of one submitted task
//! - **Coordinator events**: fatal escalation and shutdown
//! - **Subscriber events**: delivery problems of the fan-out itself
//!
//! The [`Event`] struct carries metadata such as the generation, the task id,
//! a reason and a task count.
//!
//! ## Ordering guarantees
//! Each event gets a sequence number (`seq`) from the [`Bus`](crate::events::Bus)
//! it is published on. Sequence numbers are unique and increasing per coordinator,
//! so `seq` restores the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use pagevisor::{Event, EventKind, GenerationId};
//!
//! let ev = Event::new(EventKind::BrowserCloseFailed)
//!     .with_generation(GenerationId::new(2))
//!     .with_reason("connection reset");
//!
//! assert_eq!(ev.kind, EventKind::BrowserCloseFailed);
//! assert_eq!(ev.generation, Some(GenerationId::new(2)));
//! assert_eq!(ev.reason.as_deref(), Some("connection reset"));
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::mpsc::error::TrySendError;

use crate::core::{GenerationId, TaskId};

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Generation events ===
    /// Browser launch started.
    ///
    /// Sets:
    /// - `generation`
    GenerationLaunching,

    /// Browser launched; the generation runs tasks.
    ///
    /// Sets:
    /// - `generation`
    GenerationReady,

    /// Browser launch failed (fatal).
    ///
    /// Sets:
    /// - `generation`
    /// - `reason`: launch error
    LaunchFailed,

    /// Generation stopped accepting tasks (newer generation, fatal error or shutdown).
    ///
    /// Sets:
    /// - `generation`
    GenerationSuperseded,

    /// Queue drained; browser close started.
    ///
    /// Sets:
    /// - `generation`
    /// - `tasks`: tasks accepted by the generation
    GenerationClosing,

    /// Browser close failed (fatal).
    ///
    /// Sets:
    /// - `generation`
    /// - `reason`: close error
    BrowserCloseFailed,

    /// Generation reached its terminal state.
    ///
    /// Sets:
    /// - `generation`
    /// - `tasks`: tasks accepted by the generation
    GenerationClosed,

    // === Task events ===
    /// Task taken off the queue; its page is about to be opened.
    ///
    /// Sets:
    /// - `generation`
    /// - `task`
    TaskStarting,

    /// Task finished successfully and its page was closed.
    ///
    /// Sets:
    /// - `generation`
    /// - `task`
    TaskCompleted,

    /// Task work failed or panicked; its page was closed.
    ///
    /// Sets:
    /// - `generation`
    /// - `task`
    /// - `reason`: failure message
    TaskFailed,

    /// Page could not be opened; the work never ran.
    ///
    /// Sets:
    /// - `generation`
    /// - `task`
    /// - `reason`: open error
    PageOpenFailed,

    /// Page close failed after the work (fatal).
    ///
    /// Sets:
    /// - `generation`
    /// - `task`
    /// - `reason`: close error
    PageCloseFailed,

    // === Coordinator events ===
    /// First browser lifecycle failure; the coordinator is now fatally closed.
    ///
    /// Sets:
    /// - `generation`: generation where it happened
    /// - `reason`: fatal error
    FatalRaised,

    /// Later lifecycle failure, swallowed because the coordinator is already fatal.
    ///
    /// Sets:
    /// - `generation`
    /// - `reason`: fatal error
    FatalSuppressed,

    /// `shutdown()` accepted.
    ShutdownRequested,

    /// Every generation closed; last event published by a coordinator.
    CoordinatorClosed,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: sequence number assigned by the bus on publish
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Per-coordinator, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Generation the event belongs to, if applicable.
    pub generation: Option<GenerationId>,
    /// Task the event belongs to, if applicable.
    pub task: Option<TaskId>,
    /// Number of tasks accepted by a generation.
    pub tasks: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Name of the subscriber, for subscriber events.
    pub subscriber: Option<&'static str>,
}

impl Event {
    /// Creates a new event of the given kind stamped with the current time.
    ///
    /// `seq` stays 0 until the event is published.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            kind,
            generation: None,
            task: None,
            tasks: None,
            reason: None,
            subscriber: None,
        }
    }

    /// Attaches a generation id.
    #[inline]
    pub fn with_generation(mut self, generation: GenerationId) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, task: TaskId) -> Self {
        self.task = Some(task);
        self
    }

    /// Attaches a task count.
    #[inline]
    pub fn with_tasks(mut self, tasks: u64) -> Self {
        self.tasks = Some(tasks);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Overflow event for an event `subscriber`'s queue refused.
    pub(crate) fn undelivered<T>(subscriber: &'static str, err: &TrySendError<T>) -> Self {
        let reason = match err {
            TrySendError::Full(_) => "full",
            TrySendError::Closed(_) => "closed",
        };
        Self::subscriber_overflow(subscriber, reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
