//! # Type-erased queued task.
//!
//! A generation's queue holds [`Job`]s regardless of what each task returns.
//! A job is consumed exactly once, in one of two ways:
//!
//! ```text
//! Job::run(browser)  ──► run_in_page(work) ──► Completion { outcome, deliver }
//!                                                 │
//!                          generation inspects outcome (events, fatal escalation)
//!                                                 ▼
//!                                          completion.deliver()  ──► caller's oneshot
//!
//! Job::abort(error)  ──► caller's oneshot receives Err(error)   (browser never launched)
//! ```
//!
//! Delivery is split from execution so that the generation can escalate a page
//! close failure *before* the caller sees the task's outcome.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::oneshot;

use crate::browser::Browser;
use crate::core::{TaskId, page_scope::run_in_page};
use crate::error::TaskError;

/// Result of executing a job, with the caller's outcome not yet delivered.
pub(crate) struct Completion {
    /// Outcome without the task's value (which only the caller gets).
    pub(crate) outcome: Result<(), TaskError>,
    deliver: Box<dyn FnOnce() + Send>,
}

impl Completion {
    /// Hands the full outcome to the caller.
    pub(crate) fn deliver(self) {
        (self.deliver)();
    }
}

/// Object-safe view of one submitted task.
trait Work<B: Browser>: Send {
    fn run(self: Box<Self>, browser: Arc<B>) -> BoxFuture<'static, Completion>;
    fn abort(self: Box<Self>, error: TaskError);
}

struct WorkItem<F, T> {
    work: F,
    reply: oneshot::Sender<Result<T, TaskError>>,
}

impl<B, F, Fut, T> Work<B> for WorkItem<F, T>
where
    B: Browser,
    F: FnOnce(Arc<B::Page>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    T: Send + 'static,
{
    fn run(self: Box<Self>, browser: Arc<B>) -> BoxFuture<'static, Completion> {
        let WorkItem { work, reply } = *self;
        Box::pin(async move {
            let result = run_in_page(browser.as_ref(), work).await;
            let outcome = match &result {
                Ok(_) => Ok(()),
                Err(e) => Err(e.clone()),
            };
            Completion {
                outcome,
                deliver: Box::new(move || {
                    let _ = reply.send(result);
                }),
            }
        })
    }

    fn abort(self: Box<Self>, error: TaskError) {
        let _ = self.reply.send(Err(error));
    }
}

/// Task waiting in a generation's queue.
pub(crate) struct Job<B: Browser> {
    id: TaskId,
    work: Box<dyn Work<B>>,
}

impl<B: Browser> Job<B> {
    /// Wraps `work`; its outcome is sent to `reply`.
    pub(crate) fn new<F, Fut, T>(
        id: TaskId,
        work: F,
        reply: oneshot::Sender<Result<T, TaskError>>,
    ) -> Self
    where
        F: FnOnce(Arc<B::Page>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
        T: Send + 'static,
    {
        Self {
            id,
            work: Box::new(WorkItem { work, reply }),
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    /// Opens a page on `browser` and runs the task in it.
    pub(crate) fn run(self, browser: Arc<B>) -> BoxFuture<'static, Completion> {
        self.work.run(browser)
    }

    /// Fails the task without running it.
    pub(crate) fn abort(self, error: TaskError) {
        self.work.abort(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Launcher;
    use crate::testing::{MockBrowser, MockLauncher, MockPage};

    #[tokio::test]
    async fn outcome_is_held_until_delivered() {
        let mock = MockLauncher::new();
        let browser = Arc::new(mock.launch().await.unwrap());
        let (tx, mut rx) = oneshot::channel();

        let job: Job<MockBrowser> = Job::new(
            TaskId::new(7),
            |page: Arc<MockPage>| async move { Ok(page.label()) },
            tx,
        );
        assert_eq!(job.id(), TaskId::new(7));

        let completion = job.run(browser).await;
        assert_eq!(completion.outcome, Ok(()));
        assert!(rx.try_recv().is_err());
        assert_eq!(mock.page_closes(0), 1);

        completion.deliver();
        assert_eq!(rx.await.unwrap(), Ok("0/0".to_string()));
    }

    #[tokio::test]
    async fn abort_fails_without_opening_a_page() {
        let mock = MockLauncher::new();
        let (tx, rx) = oneshot::channel::<Result<(), TaskError>>();

        let job: Job<MockBrowser> = Job::new(TaskId::new(0), |_page| async { Ok(()) }, tx);
        job.abort(TaskError::Launch {
            error: "no binary".into(),
        });

        assert_eq!(
            rx.await.unwrap(),
            Err(TaskError::Launch {
                error: "no binary".into()
            })
        );
        assert_eq!(mock.pages_opened(), 0);
    }
}
