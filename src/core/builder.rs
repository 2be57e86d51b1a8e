use std::sync::Arc;

use crate::{
    browser::Launcher,
    core::{Config, coordinator::Coordinator},
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};
use super::{listener::Listener, mailbox::Mailbox, sequencer::Sequencer};

/// Builder for constructing a [`Coordinator`] with optional features.
pub struct CoordinatorBuilder<L: Launcher> {
    launcher: L,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<L: Launcher> CoordinatorBuilder<L> {
    /// Creates a new builder around `launcher` with the default configuration.
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            cfg: Config::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (generation lifecycle, task outcomes,
    /// fatal escalation) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the coordinator and starts launching generation 0.
    ///
    /// Initializes, in order:
    /// - the event bus and subscriber workers
    /// - the bus listener (before anything is published)
    /// - the sequencer, which starts generation 0 as the current generation
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Coordinator<L::Browser> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let listener = Listener::spawn(&bus, subs);

        let (mailbox, inbox) = Mailbox::new();
        let observers = Sequencer::start(
            Arc::new(self.launcher),
            &self.cfg,
            bus.clone(),
            mailbox.clone(),
            inbox,
            listener,
        );

        Coordinator::new_internal(mailbox, observers, bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GenerationId, Status};
    use crate::testing::MockLauncher;

    #[tokio::test]
    async fn tiny_queue_still_accepts_work() {
        let mock = MockLauncher::new();
        let c = CoordinatorBuilder::new(mock.clone())
            .with_config(Config {
                bus_capacity: 0,
                queue_capacity: 0,
            })
            .build();

        assert_eq!(c.current_generation(), Some(GenerationId::new(0)));
        let (a, b) = futures::future::join(
            c.submit(|page| async move { Ok(page.label()) }),
            c.submit(|page| async move { Ok(page.label()) }),
        )
        .await;
        assert_eq!(a, Ok("0/0".to_string()));
        assert_eq!(b, Ok("0/1".to_string()));

        c.shutdown().await;
        assert_eq!(c.status(), Status::Closed);
    }
}
