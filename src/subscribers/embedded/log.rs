//! # LogWriter: structured event logging
//!
//! A subscriber that forwards every [`Event`] to `tracing` under the
//! `pagevisor` target. Lifecycle noise goes to `debug`, failures to `warn`,
//! fatal escalation to `error`. Install any `tracing` subscriber to see it.
//!
//! ## Example output (tracing-subscriber fmt)
//! ```text
//! DEBUG pagevisor: generation launching seq=1 generation=0
//! DEBUG pagevisor: generation ready seq=2 generation=0
//! DEBUG pagevisor: task starting seq=4 generation=0 task=0
//!  WARN pagevisor: page close failed seq=6 generation=0 task=0 reason="socket closed"
//! ERROR pagevisor: fatal raised seq=7 generation=0 reason="generation 0: page close failed: socket closed"
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let seq = e.seq;
        let generation = e.generation.map(|g| g.get());
        let task = e.task.map(|t| t.get());
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::GenerationLaunching => {
                debug!(target: "pagevisor", seq, generation, "generation launching");
            }
            EventKind::GenerationReady => {
                debug!(target: "pagevisor", seq, generation, "generation ready");
            }
            EventKind::LaunchFailed => {
                warn!(target: "pagevisor", seq, generation, reason, "launch failed");
            }
            EventKind::GenerationSuperseded => {
                debug!(target: "pagevisor", seq, generation, "generation superseded");
            }
            EventKind::GenerationClosing => {
                debug!(target: "pagevisor", seq, generation, tasks = e.tasks, "generation closing");
            }
            EventKind::BrowserCloseFailed => {
                warn!(target: "pagevisor", seq, generation, reason, "browser close failed");
            }
            EventKind::GenerationClosed => {
                info!(target: "pagevisor", seq, generation, tasks = e.tasks, "generation closed");
            }
            EventKind::TaskStarting => {
                debug!(target: "pagevisor", seq, generation, task, "task starting");
            }
            EventKind::TaskCompleted => {
                debug!(target: "pagevisor", seq, generation, task, "task completed");
            }
            EventKind::TaskFailed => {
                debug!(target: "pagevisor", seq, generation, task, reason, "task failed");
            }
            EventKind::PageOpenFailed => {
                warn!(target: "pagevisor", seq, generation, task, reason, "page open failed");
            }
            EventKind::PageCloseFailed => {
                warn!(target: "pagevisor", seq, generation, task, reason, "page close failed");
            }
            EventKind::FatalRaised => {
                error!(target: "pagevisor", seq, generation, reason, "fatal raised");
            }
            EventKind::FatalSuppressed => {
                warn!(target: "pagevisor", seq, generation, reason, "fatal suppressed");
            }
            EventKind::ShutdownRequested => {
                info!(target: "pagevisor", seq, "shutdown requested");
            }
            EventKind::CoordinatorClosed => {
                info!(target: "pagevisor", seq, "coordinator closed");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "pagevisor", seq, subscriber = e.subscriber, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(target: "pagevisor", seq, subscriber = e.subscriber, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
