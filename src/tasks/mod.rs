//! # Queued tasks.
//!
//! - [`Job`] - a submitted task, type-erased so one generation queue holds tasks of any result type
//! - [`Completion`] - an executed job whose outcome has not reached the caller yet

mod job;

pub(crate) use job::{Completion, Job};
