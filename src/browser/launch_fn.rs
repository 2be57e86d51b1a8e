//! # Function-backed launcher (`LaunchFn`)
//!
//! [`LaunchFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh launch
//! future per generation. Shared state (counters, connection settings) goes into
//! the closure explicitly, e.g. behind an `Arc`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use pagevisor::{Browser, LaunchFn, Page};
//!
//! struct Tab;
//! #[async_trait]
//! impl Page for Tab {
//!     async fn close(&self) -> anyhow::Result<()> { Ok(()) }
//! }
//!
//! struct Chrome { id: u64 }
//! #[async_trait]
//! impl Browser for Chrome {
//!     type Page = Tab;
//!     async fn new_page(&self) -> anyhow::Result<Tab> { Ok(Tab) }
//!     async fn close(&self) -> anyhow::Result<()> { Ok(()) }
//! }
//!
//! let launched = Arc::new(AtomicU64::new(0));
//! let launcher = LaunchFn::new(move || {
//!     let id = launched.fetch_add(1, Ordering::Relaxed);
//!     async move { Ok::<_, anyhow::Error>(Chrome { id }) }
//! });
//! # let _ = launcher;
//! ```

use std::future::Future;

use async_trait::async_trait;

use crate::browser::{Browser, Launcher};

/// Function-backed launcher implementation.
///
/// Wraps a closure that *creates* a new launch future per call.
#[derive(Debug, Clone)]
pub struct LaunchFn<F> {
    f: F,
}

impl<F> LaunchFn<F> {
    /// Creates a new function-backed launcher.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut, B> Launcher for LaunchFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = anyhow::Result<B>> + Send + 'static,
    B: Browser,
{
    type Browser = B;

    async fn launch(&self) -> anyhow::Result<B> {
        (self.f)().await
    }
}
