//! # Browser collaborator contract.
//!
//! The coordinator never launches or drives a browser itself. It talks to three
//! async capabilities supplied by the caller:
//! - [`Launcher`] - creates a browser (one per generation);
//! - [`Browser`] - opens pages and is closed exactly once by its generation;
//! - [`Page`] - handed to one task, closed exactly once after the task.
//!
//! [`LaunchFn`] adapts a plain async closure into a [`Launcher`].
//!
//! "Browser" and "page" are names, not requirements: any expensive resource with
//! cheap, short-lived sub-resources fits the same contract.

mod launch_fn;
mod traits;

pub use launch_fn::LaunchFn;
pub use traits::{Browser, Launcher, Page};
