//! # Collaborator traits.
//!
//! All methods are async and fallible. Failures are reported as [`anyhow::Error`];
//! the coordinator decides which of them are fatal:
//!
//! | call                 | on failure                                   |
//! |----------------------|----------------------------------------------|
//! | `Launcher::launch`   | fatal, generation closes without a browser   |
//! | `Browser::new_page`  | task fails with `TaskError::PageOpen`        |
//! | `Page::close`        | fatal, and the task fails with `PageClose`   |
//! | `Browser::close`     | fatal                                        |

use async_trait::async_trait;

/// # Browser factory.
///
/// Called once per generation, from that generation's runtime task.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use pagevisor::{Browser, Launcher, Page};
///
/// struct Tab;
///
/// #[async_trait]
/// impl Page for Tab {
///     async fn close(&self) -> anyhow::Result<()> { Ok(()) }
/// }
///
/// struct Chrome;
///
/// #[async_trait]
/// impl Browser for Chrome {
///     type Page = Tab;
///     async fn new_page(&self) -> anyhow::Result<Tab> { Ok(Tab) }
///     async fn close(&self) -> anyhow::Result<()> { Ok(()) }
/// }
///
/// struct Local;
///
/// #[async_trait]
/// impl Launcher for Local {
///     type Browser = Chrome;
///     async fn launch(&self) -> anyhow::Result<Chrome> { Ok(Chrome) }
/// }
/// ```
#[async_trait]
pub trait Launcher: Send + Sync + 'static {
    /// Browser produced by this launcher.
    type Browser: Browser;

    /// Launches a new browser.
    async fn launch(&self) -> anyhow::Result<Self::Browser>;
}

/// # Expensive session resource owned by one generation.
///
/// A generation shares its browser only with the task it is currently running,
/// so two tasks never use it at the same time.
#[async_trait]
pub trait Browser: Send + Sync + 'static {
    /// Short-lived page handed to tasks.
    type Page: Page;

    /// Opens a fresh page for one task.
    async fn new_page(&self) -> anyhow::Result<Self::Page>;

    /// Releases the browser. Called at most once, after the queue has drained.
    async fn close(&self) -> anyhow::Result<()>;
}

/// # Per-task sub-resource.
///
/// Tasks receive it as `Arc<Self>` and may call any of its own methods; the
/// coordinator only ever calls [`Page::close`], exactly once per page.
#[async_trait]
pub trait Page: Send + Sync + 'static {
    /// Releases the page.
    async fn close(&self) -> anyhow::Result<()>;
}
