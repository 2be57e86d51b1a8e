//! # pagevisor
//!
//! **Pagevisor** serializes work against an expensive, replaceable browser.
//!
//! Callers submit tasks; each task runs alone against a fresh page of the
//! current browser, and the page is always closed afterwards. The browser
//! itself lives in a *generation*: on request, a new generation launches a new
//! browser, takes over, and the old one drains its queue and closes in the
//! background. Any browser lifecycle failure (launch, page close, browser close)
//! closes the coordinator for good.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   submit(work)        request_new_generation()        shutdown()
//!        │                       │                          │
//!        │ current (watch)       └──────────┬───────────────┘
//!        │                                  ▼
//!        │                       ┌──────────────────────┐
//!        │                       │ Sequencer (mailbox)  │
//!        │                       │ - status             │
//!        │                       │ - generation slots   │
//!        │                       │ - first fatal error  │
//!        │                       └──┬───────────────┬───┘
//!        │           spawn / cutoff │               │ spawn / cutoff
//!        ▼                          ▼               ▼
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │ GenerationActor N        │   │ GenerationActor N+1      │
//! │ browser + FIFO job queue │   │ browser + FIFO job queue │
//! │ one page per job         │   │ one page per job         │
//! └────────────┬─────────────┘   └────────────┬─────────────┘
//!              │ Launched / Fatal / Closed    │
//!              └──────────► mailbox ◄─────────┘
//!
//!   every component ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                          ┌────────┼────────┐
//!                                                          ▼        ▼        ▼
//!                                                       worker1  worker2  workerN
//! ```
//!
//! ### Generation lifecycle
//! ```text
//! Launching ──► Ready ──► Superseded ──► Closing ──► Closed
//!     │                                                ▲
//!     └────────────── launch failed (fatal) ───────────┘
//!
//! per job: new_page() ──► work(page) ──► page.close() ──► deliver outcome
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                       |
//! |-------------------|---------------------------------------------------------------|------------------------------------------|
//! | **Coordination**  | Submit tasks, replace the browser, shut down.                 | [`Coordinator`], [`CoordinatorBuilder`]  |
//! | **Collaborators** | Plug in any browser-like resource.                            | [`Launcher`], [`Browser`], [`Page`], [`LaunchFn`] |
//! | **Introspection** | Status, generations and the fatal cause.                      | [`Snapshot`], [`Status`], [`FatalError`] |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, alerts).        | [`Subscribe`], [`Event`]                 |
//! | **Errors**        | Typed errors for tasks and generation requests.               | [`TaskError`], [`RequestError`]          |
//! | **Configuration** | Bus and queue capacities.                                     | [`Config`]                               |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] that renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use pagevisor::{Browser, Config, Coordinator, LaunchFn, Page};
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
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn pagevisor::Subscribe>> = vec![Arc::new(pagevisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn pagevisor::Subscribe>> = Vec::new();
//!
//!     let launcher = LaunchFn::new(|| async { Ok::<_, anyhow::Error>(Chrome) });
//!     let coordinator = Coordinator::builder(launcher)
//!         .with_config(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let title = coordinator
//!         .submit(|_tab: Arc<Tab>| async move { Ok("example domain".to_string()) })
//!         .await?;
//!     println!("{title}");
//!
//!     // Swap the browser; tasks already queued finish on the old one.
//!     coordinator.request_new_generation().await?;
//!
//!     coordinator.shutdown().await;
//!     Ok(())
//! }
//! ```
mod browser;
mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use browser::{Browser, LaunchFn, Launcher, Page};
pub use crate::core::{
    Config, Coordinator, CoordinatorBuilder, GenerationId, GenerationInfo, GenerationState,
    Snapshot, Status, TaskId,
};
pub use error::{FatalError, RequestError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
