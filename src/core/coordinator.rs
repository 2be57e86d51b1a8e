//! # Coordinator: public handle to a browser session coordinator.
//!
//! [`Coordinator`] is a cheap, cloneable handle. All state lives in the
//! sequencer task; the handle only sends commands to its mailbox and reads the
//! published `watch` values.
//!
//! ## Operations
//! ```text
//! submit(work)
//!   ├─► read current generation (watch) ── None ──► TaskError::NoActiveGeneration
//!   ├─► enqueue Job on that generation ─── cut off ──► TaskError::Superseded
//!   └─► await the job's outcome (page opened, work run, page closed)
//!
//! request_new_generation()
//!   └─► Command::Request ──► previous generation cut off, new one current at once
//!                        ──► resolves when the new browser is ready
//!
//! shutdown()
//!   └─► Command::Shutdown ──► resolves when the snapshot reports Closed
//! ```
//!
//! Dropping the last handle requests shutdown; generations still drain and
//! close their browsers in the background.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use pagevisor::{Browser, Coordinator, Launcher, Page, TaskError};
//!
//! struct Tab;
//! #[async_trait]
//! impl Page for Tab {
//!     async fn close(&self) -> anyhow::Result<()> { Ok(()) }
//! }
//!
//! struct Chrome;
//! #[async_trait]
//! impl Browser for Chrome {
//!     type Page = Tab;
//!     async fn new_page(&self) -> anyhow::Result<Tab> { Ok(Tab) }
//!     async fn close(&self) -> anyhow::Result<()> { Ok(()) }
//! }
//!
//! struct Local;
//! #[async_trait]
//! impl Launcher for Local {
//!     type Browser = Chrome;
//!     async fn launch(&self) -> anyhow::Result<Chrome> { Ok(Chrome) }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), TaskError> {
//!     let coordinator = Coordinator::start(Local);
//!
//!     let answer = coordinator.submit(|_tab| async move { Ok(42) }).await?;
//!     assert_eq!(answer, 42);
//!
//!     coordinator.request_new_generation().await.expect("still active");
//!     coordinator.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::{broadcast, oneshot, watch};

use crate::browser::{Browser, Launcher};
use crate::core::builder::CoordinatorBuilder;
use crate::core::generation::GenerationHandle;
use crate::core::mailbox::{Command, Mailbox};
use crate::core::sequencer::Observers;
use crate::core::{GenerationId, Snapshot, Status, TaskId};
use crate::error::{FatalError, RequestError, TaskError};
use crate::events::{Bus, Event};
use crate::tasks::Job;

/// Handle to a running coordinator.
///
/// Clones share the same coordinator.
pub struct Coordinator<B: Browser> {
    inner: Arc<Inner<B>>,
}

impl<B: Browser> Clone for Coordinator<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<B: Browser> {
    mailbox: Mailbox,
    current: watch::Receiver<Option<GenerationHandle<B>>>,
    snapshot: watch::Receiver<Snapshot>,
    fatal: Arc<OnceLock<FatalError>>,
    bus: Bus,
    next_task: AtomicU64,
}

impl<B: Browser> Drop for Inner<B> {
    fn drop(&mut self) {
        self.mailbox.send(Command::Shutdown);
    }
}

impl<B: Browser> Coordinator<B> {
    /// Returns a builder for a coordinator backed by `launcher`.
    pub fn builder<L>(launcher: L) -> CoordinatorBuilder<L>
    where
        L: Launcher<Browser = B>,
    {
        CoordinatorBuilder::new(launcher)
    }

    /// Starts a coordinator with the default configuration and no subscribers.
    ///
    /// Generation 0 starts launching immediately. Must be called from within a
    /// Tokio runtime.
    pub fn start<L>(launcher: L) -> Self
    where
        L: Launcher<Browser = B>,
    {
        CoordinatorBuilder::new(launcher).build()
    }

    pub(crate) fn new_internal(mailbox: Mailbox, observers: Observers<B>, bus: Bus) -> Self {
        let Observers {
            current,
            snapshot,
            fatal,
        } = observers;
        Self {
            inner: Arc::new(Inner {
                mailbox,
                current,
                snapshot,
                fatal,
                bus,
                next_task: AtomicU64::new(0),
            }),
        }
    }

    /// Runs `work` with a fresh page of the current generation's browser.
    ///
    /// The task is bound to the generation that is current at call time and
    /// runs there even if a newer generation becomes current meanwhile. Tasks
    /// of one generation run one at a time, in submission order. The page is
    /// closed before this returns, whatever `work` did.
    ///
    /// # Errors
    /// - [`TaskError::NoActiveGeneration`] if the coordinator is not `Active`;
    /// - [`TaskError::Superseded`] if the generation stopped accepting tasks
    ///   before this one was queued;
    /// - [`TaskError::Launch`] if that generation's browser failed to launch;
    /// - [`TaskError::PageOpen`], [`TaskError::PageClose`] for page failures;
    /// - whatever `work` returned, or [`TaskError::Panicked`].
    pub async fn submit<F, Fut, T>(&self, work: F) -> Result<T, TaskError>
    where
        F: FnOnce(Arc<B::Page>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
        T: Send + 'static,
    {
        let generation = self
            .inner
            .current
            .borrow()
            .clone()
            .ok_or(TaskError::NoActiveGeneration)?;

        let id = TaskId::new(self.inner.next_task.fetch_add(1, Ordering::Relaxed));
        let (reply, outcome) = oneshot::channel();
        generation.enqueue(Job::new(id, work, reply)).await?;

        outcome.await.unwrap_or(Err(TaskError::Dropped))
    }

    /// Starts a new generation and waits until its browser is ready.
    ///
    /// The new generation becomes current as soon as the request is taken, and
    /// tasks submitted while it launches queue until the browser is up. The
    /// previous generation stops accepting tasks at that moment; its queued
    /// tasks drain and its browser closes in the background. Resolves with the
    /// id of the generation that is current when the request is fulfilled.
    ///
    /// # Errors
    /// - [`RequestError::NotActive`] if the coordinator is not `Active`, or
    ///   leaves `Active` before the new generation is ready;
    /// - [`RequestError::Launch`] if the new browser fails to launch (which
    ///   also closes the coordinator fatally).
    pub async fn request_new_generation(&self) -> Result<GenerationId, RequestError> {
        let (reply, outcome) = oneshot::channel();
        self.inner.mailbox.send(Command::Request { reply });
        outcome.await.unwrap_or(Err(RequestError::NotActive))
    }

    /// Stops accepting work and waits until every generation is closed.
    ///
    /// Queued tasks still run. Idempotent; concurrent callers all return once
    /// the coordinator is [`Status::Closed`].
    pub async fn shutdown(&self) {
        self.inner.mailbox.send(Command::Shutdown);
        let mut snapshot = self.inner.snapshot.clone();
        let _ = snapshot.wait_for(|s| s.status == Status::Closed).await;
    }

    /// Current coordinator status.
    pub fn status(&self) -> Status {
        self.inner.snapshot.borrow().status
    }

    /// Generation new submissions are bound to, if any.
    pub fn current_generation(&self) -> Option<GenerationId> {
        self.inner
            .current
            .borrow()
            .as_ref()
            .map(GenerationHandle::id)
    }

    /// Point-in-time view of the coordinator and its generations.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver that observes every published [`Snapshot`].
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshot.clone()
    }

    /// The failure that fatally closed the coordinator, if any.
    pub fn fatal_error(&self) -> Option<FatalError> {
        self.inner.fatal.get().cloned()
    }

    /// Raw receiver of runtime events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }
}
