//! Runtime core: generations, sequencing and the public coordinator handle.
//!
//! The only public API from this module is [`Coordinator`] (with its builder,
//! configuration and state types).
//!
//! Internal modules:
//! - [`sequencer`]: the coordinator state machine, driven by the [`mailbox`];
//! - [`generation`]: one browser and its single-flight task queue;
//! - [`page_scope`]: opens, lends and always closes one page per task;
//! - [`listener`]: forwards bus events to subscribers.

mod builder;
mod config;
mod coordinator;
mod generation;
mod listener;
mod mailbox;
pub(crate) mod page_scope;
mod sequencer;
mod state;

pub use builder::CoordinatorBuilder;
pub use config::Config;
pub use coordinator::Coordinator;
pub use state::{GenerationId, GenerationInfo, GenerationState, Snapshot, Status, TaskId};
