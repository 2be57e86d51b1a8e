//! # GenerationActor: one browser, one serialized task queue.
//!
//! Each generation runs as its own Tokio task. It owns the browser exclusively
//! and executes queued jobs one at a time.
//!
//! ## Lifecycle
//! ```text
//! publish GenerationLaunching
//! launcher.launch()
//!   ├─ Err ──► publish LaunchFailed ──► mailbox.launch_failed (ack)
//!   │          close queue, abort queued jobs with TaskError::Launch ──► finish
//!   └─ Ok  ──► publish GenerationReady ──► mailbox Launched
//!
//! loop {
//!   select (biased) {
//!     cutoff cancelled ──► break
//!     job = queue.recv() ──► execute(job)
//!   }
//! }
//! close queue, execute whatever was already accepted (drain)
//! publish GenerationClosing ──► mailbox Closing
//! browser.close()
//!   └─ Err ──► publish BrowserCloseFailed ──► mailbox.raise_fatal (ack)
//! finish: publish GenerationClosed{tasks} ──► mailbox Closed{tasks}
//! ```
//!
//! ## Rules
//! - Jobs run **sequentially** in queue order; two jobs never share the browser.
//! - A job accepted by the queue never runs on another generation's browser.
//! - The browser is closed **once**, only after the queue is drained.
//! - A page close failure is escalated (and acknowledged) **before** the caller
//!   receives the task outcome.
//! - A panic in a collaborator is caught; the generation still reports `Closed`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::browser::{Browser, Launcher};
use crate::core::GenerationId;
use crate::core::mailbox::{Command, Mailbox};
use crate::error::{FatalError, TaskError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::Job;

/// Enqueue side of a generation, shared by the coordinator and submitters.
pub(crate) struct GenerationHandle<B: Browser> {
    id: GenerationId,
    jobs: mpsc::Sender<Job<B>>,
}

impl<B: Browser> Clone for GenerationHandle<B> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            jobs: self.jobs.clone(),
        }
    }
}

impl<B: Browser> GenerationHandle<B> {
    pub(crate) fn id(&self) -> GenerationId {
        self.id
    }

    /// Appends a job to the queue, waiting for room if it is full.
    ///
    /// Fails with [`TaskError::Superseded`] once the queue has been cut off.
    pub(crate) async fn enqueue(&self, job: Job<B>) -> Result<(), TaskError> {
        self.jobs
            .send(job)
            .await
            .map_err(|_| TaskError::Superseded {
                generation: self.id,
            })
    }
}

/// Runtime of a single generation.
pub(crate) struct GenerationActor<L: Launcher> {
    id: GenerationId,
    launcher: Arc<L>,
    jobs: mpsc::Receiver<Job<L::Browser>>,
    cutoff: CancellationToken,
    mailbox: Mailbox,
    bus: Bus,
    /// Every job taken off the queue, aborted ones included.
    accepted: u64,
}

impl<L: Launcher> GenerationActor<L> {
    pub(crate) fn new(
        id: GenerationId,
        launcher: Arc<L>,
        queue_capacity: usize,
        cutoff: CancellationToken,
        mailbox: Mailbox,
        bus: Bus,
    ) -> (Self, GenerationHandle<L::Browser>) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let actor = Self {
            id,
            launcher,
            jobs: rx,
            cutoff,
            mailbox,
            bus,
            accepted: 0,
        };
        (actor, GenerationHandle { id, jobs: tx })
    }

    /// Runs the generation to completion. Always ends with `Command::Closed`.
    pub(crate) async fn run(mut self) {
        let outcome = AssertUnwindSafe(self.drive()).catch_unwind().await;

        if let Err(payload) = outcome {
            self.jobs.close();
            while let Ok(job) = self.jobs.try_recv() {
                self.accepted += 1;
                job.abort(TaskError::Dropped);
            }
            self.mailbox
                .raise_fatal(FatalError::Panicked {
                    generation: self.id,
                    info: panic_message(payload),
                })
                .await;
        }

        self.bus.publish(
            Event::new(EventKind::GenerationClosed)
                .with_generation(self.id)
                .with_tasks(self.accepted),
        );
        self.mailbox.send(Command::Closed {
            generation: self.id,
            tasks: self.accepted,
        });
    }

    async fn drive(&mut self) {
        self.bus
            .publish(Event::new(EventKind::GenerationLaunching).with_generation(self.id));

        let browser = match self.launcher.launch().await {
            Ok(browser) => Arc::new(browser),
            Err(e) => {
                self.abandon(format!("{e:#}")).await;
                return;
            }
        };
        self.bus
            .publish(Event::new(EventKind::GenerationReady).with_generation(self.id));
        self.mailbox.send(Command::Launched {
            generation: self.id,
        });

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cutoff.cancelled() => None,
                job = self.jobs.recv() => job,
            };
            match next {
                Some(job) => self.execute(&browser, job).await,
                None => break,
            }
        }

        self.jobs.close();
        while let Some(job) = self.jobs.recv().await {
            self.execute(&browser, job).await;
        }

        self.bus.publish(
            Event::new(EventKind::GenerationClosing)
                .with_generation(self.id)
                .with_tasks(self.accepted),
        );
        self.mailbox.send(Command::Closing {
            generation: self.id,
        });

        if let Err(e) = browser.close().await {
            let error = format!("{e:#}");
            self.bus.publish(
                Event::new(EventKind::BrowserCloseFailed)
                    .with_generation(self.id)
                    .with_reason(error.as_str()),
            );
            self.mailbox
                .raise_fatal(FatalError::BrowserClose {
                    generation: self.id,
                    error,
                })
                .await;
        }
    }

    /// Launch failed: report it, then fail everything already queued.
    async fn abandon(&mut self, error: String) {
        self.bus.publish(
            Event::new(EventKind::LaunchFailed)
                .with_generation(self.id)
                .with_reason(error.as_str()),
        );
        self.mailbox.launch_failed(self.id, error.clone()).await;

        self.jobs.close();
        while let Some(job) = self.jobs.recv().await {
            self.accepted += 1;
            job.abort(TaskError::Launch {
                error: error.clone(),
            });
        }
    }

    async fn execute(&mut self, browser: &Arc<L::Browser>, job: Job<L::Browser>) {
        let task = job.id();
        self.accepted += 1;
        self.bus.publish(
            Event::new(EventKind::TaskStarting)
                .with_generation(self.id)
                .with_task(task),
        );

        let completion = job.run(Arc::clone(browser)).await;

        let ev = |kind| Event::new(kind).with_generation(self.id).with_task(task);
        match &completion.outcome {
            Ok(()) => self.bus.publish(ev(EventKind::TaskCompleted)),
            Err(TaskError::PageOpen { error }) => self
                .bus
                .publish(ev(EventKind::PageOpenFailed).with_reason(error.as_str())),
            Err(TaskError::PageClose { error, .. }) => {
                self.bus
                    .publish(ev(EventKind::PageCloseFailed).with_reason(error.as_str()));
                self.mailbox
                    .raise_fatal(FatalError::PageClose {
                        generation: self.id,
                        error: error.clone(),
                    })
                    .await;
            }
            Err(e) => self
                .bus
                .publish(ev(EventKind::TaskFailed).with_reason(e.to_string())),
        }

        completion.deliver();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::{mpsc::UnboundedReceiver, oneshot};

    use super::*;
    use crate::core::TaskId;
    use crate::testing::{MockBrowser, MockLauncher, MockPage};

    struct Harness {
        mock: MockLauncher,
        handle: GenerationHandle<MockBrowser>,
        cutoff: CancellationToken,
        inbox: UnboundedReceiver<Command>,
        actor: tokio::task::JoinHandle<()>,
    }

    fn start(mock: &MockLauncher) -> Harness {
        let (mailbox, inbox) = Mailbox::new();
        let cutoff = CancellationToken::new();
        let (actor, handle) = GenerationActor::new(
            GenerationId::new(0),
            Arc::new(mock.clone()),
            8,
            cutoff.clone(),
            mailbox,
            Bus::new(64),
        );
        Harness {
            mock: mock.clone(),
            handle,
            cutoff,
            inbox,
            actor: tokio::spawn(actor.run()),
        }
    }

    async fn submit(
        handle: &GenerationHandle<MockBrowser>,
        id: u64,
    ) -> oneshot::Receiver<Result<String, TaskError>> {
        let (tx, rx) = oneshot::channel();
        let job = Job::new(
            TaskId::new(id),
            move |page: Arc<MockPage>| async move { Ok(format!("task {id} on {}", page.label())) },
            tx,
        );
        handle.enqueue(job).await.unwrap();
        rx
    }

    #[tokio::test]
    async fn drains_accepted_jobs_before_closing_browser() {
        let mock = MockLauncher::new();
        let mut h = start(&mock);

        let first = submit(&h.handle, 0).await;
        let second = submit(&h.handle, 1).await;
        h.cutoff.cancel();

        assert_eq!(first.await.unwrap(), Ok("task 0 on 0/0".to_string()));
        assert_eq!(second.await.unwrap(), Ok("task 1 on 0/1".to_string()));
        h.actor.await.unwrap();

        assert_eq!(h.mock.browser_closes(0), 1);
        assert!(matches!(
            h.inbox.recv().await,
            Some(Command::Launched { .. })
        ));
        assert!(matches!(h.inbox.recv().await, Some(Command::Closing { .. })));
        assert!(matches!(
            h.inbox.recv().await,
            Some(Command::Closed { tasks: 2, .. })
        ));
    }

    #[tokio::test]
    async fn enqueue_after_cutoff_is_superseded() {
        let mock = MockLauncher::new();
        let h = start(&mock);
        h.cutoff.cancel();
        h.actor.await.unwrap();

        let (tx, _rx) = oneshot::channel::<Result<(), TaskError>>();
        let job = Job::new(TaskId::new(0), |_page| async { Ok(()) }, tx);
        assert_eq!(
            h.handle.enqueue(job).await,
            Err(TaskError::Superseded {
                generation: GenerationId::new(0)
            })
        );
    }

    #[tokio::test]
    async fn launch_failure_aborts_queued_jobs() {
        let mock = MockLauncher::new();
        mock.fail_launch(0);
        let gate = mock.hold_launch(0);
        let mut h = start(&mock);

        let queued = submit(&h.handle, 0).await;
        gate.notify_one();

        match h.inbox.recv().await {
            Some(Command::LaunchFailed { error, ack, .. }) => {
                assert_eq!(error, "launch 0 refused");
                ack.send(()).unwrap();
            }
            _ => panic!("expected LaunchFailed"),
        }
        assert_eq!(
            queued.await.unwrap(),
            Err(TaskError::Launch {
                error: "launch 0 refused".into()
            })
        );
        assert!(matches!(
            h.inbox.recv().await,
            Some(Command::Closed { tasks: 1, .. })
        ));
        h.actor.await.unwrap();
    }

    #[tokio::test]
    async fn page_close_failure_is_escalated_before_delivery() {
        let mock = MockLauncher::new();
        mock.fail_page_close(0);
        let mut h = start(&mock);

        let mut outcome = submit(&h.handle, 0).await;
        assert!(matches!(
            h.inbox.recv().await,
            Some(Command::Launched { .. })
        ));

        let ack = match h.inbox.recv().await {
            Some(Command::Fatal {
                cause: FatalError::PageClose { error, .. },
                ack,
            }) => {
                assert_eq!(error, "page 0/0 close refused");
                ack
            }
            _ => panic!("expected Fatal"),
        };
        assert!(outcome.try_recv().is_err());

        ack.send(()).unwrap();
        assert!(matches!(
            outcome.await.unwrap(),
            Err(TaskError::PageClose { .. })
        ));
        h.cutoff.cancel();
        h.actor.await.unwrap();
    }
}
