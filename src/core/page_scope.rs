//! # Run one task inside a freshly opened page.
//!
//! ```text
//! new_page() ── Err ──► TaskError::PageOpen        (work never runs, nothing to close)
//!     │
//!     Ok ──► PageGuard ──► work(page) ── Ok / Err / panic
//!                              │
//!                              ▼
//!                       guard.release() ── page.close()  (exactly once)
//!                              ├─ Ok  ──► work outcome
//!                              └─ Err ──► TaskError::PageClose { task: work error }
//! ```
//!
//! ## Rules
//! - The page is closed **exactly once**, before the outcome leaves this module.
//! - A panicking work future is caught and reported as `TaskError::Panicked`.
//! - If the whole scope is dropped mid-flight, the guard still closes the page
//!   on the current runtime (close failures on that path cannot be reported).

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::browser::{Browser, Page};
use crate::error::{TaskError, panic_message};

/// Owns a page until it is explicitly released; closes it on drop otherwise.
pub(crate) struct PageGuard<P: Page> {
    page: Arc<P>,
    armed: bool,
}

impl<P: Page> PageGuard<P> {
    pub(crate) fn new(page: P) -> Self {
        Self {
            page: Arc::new(page),
            armed: true,
        }
    }

    /// Shared handle given to the task.
    pub(crate) fn page(&self) -> Arc<P> {
        Arc::clone(&self.page)
    }

    /// Closes the page and disarms the guard.
    pub(crate) async fn release(mut self) -> anyhow::Result<()> {
        self.armed = false;
        self.page.close().await
    }
}

impl<P: Page> Drop for PageGuard<P> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let page = Arc::clone(&self.page);
        if let Ok(rt) = tokio::runtime::Handle::try_current() {
            rt.spawn(async move {
                let _ = page.close().await;
            });
        }
    }
}

/// Opens a page on `browser`, runs `work` with it and closes it.
pub(crate) async fn run_in_page<B, F, Fut, T>(browser: &B, work: F) -> Result<T, TaskError>
where
    B: Browser,
    F: FnOnce(Arc<B::Page>) -> Fut,
    Fut: Future<Output = Result<T, TaskError>>,
{
    let page = browser.new_page().await.map_err(|e| TaskError::PageOpen {
        error: format!("{e:#}"),
    })?;
    let guard = PageGuard::new(page);

    let page = guard.page();
    let result = AssertUnwindSafe(async move { work(page).await })
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| {
            Err(TaskError::Panicked {
                info: panic_message(payload),
            })
        });

    match guard.release().await {
        Ok(()) => result,
        Err(e) => Err(TaskError::PageClose {
            error: format!("{e:#}"),
            task: result.err().map(Box::new),
        }),
    }
}
