//! Error types used by the coordinator, generations and tasks.
//!
//! This module defines three enums:
//!
//! - [`TaskError`]: outcome of a single submitted task (local to that task).
//! - [`RequestError`]: rejection of [`Coordinator::request_new_generation`](crate::Coordinator::request_new_generation).
//! - [`FatalError`]: the browser lifecycle failure that closed the coordinator.
//!
//! All of them provide `as_label` for logging/metrics. Collaborator failures arrive
//! as [`anyhow::Error`] and are kept as rendered strings so every error is `Clone`.

use std::any::Any;

use thiserror::Error;

use crate::core::GenerationId;

/// # Errors produced by task submission and execution.
///
/// Everything here is local to one task: it never affects other tasks or
/// generations, except [`TaskError::PageClose`] whose cause is also raised
/// as a [`FatalError`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The coordinator had no current generation at submission time
    /// (fatally closed, shutting down or closed).
    #[error("no active generation")]
    NoActiveGeneration,

    /// The generation resolved at submission time stopped accepting tasks
    /// before the task could be enqueued.
    #[error("generation {generation} no longer accepts tasks")]
    Superseded {
        /// Generation the task was bound to.
        generation: GenerationId,
    },

    /// The browser of the generation the task was bound to failed to launch.
    #[error("browser launch failed: {error}")]
    Launch {
        /// The underlying error message.
        error: String,
    },

    /// Opening a page for the task failed; the work was never invoked.
    #[error("failed to open page: {error}")]
    PageOpen {
        /// The underlying error message.
        error: String,
    },

    /// The task's own work failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The task's work panicked. The page was still closed.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Closing the task's page failed after the work finished.
    ///
    /// The work's own failure, if any, is kept in `task`.
    #[error("failed to close page: {error}")]
    PageClose {
        /// The underlying error message.
        error: String,
        /// Failure returned by the work before the page was closed.
        task: Option<Box<TaskError>>,
    },

    /// The task was dropped before an outcome was produced.
    #[error("task dropped before completion")]
    Dropped,
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from anything printable.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pagevisor::TaskError;
    ///
    /// let err = TaskError::fail("boom");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::NoActiveGeneration => "task_no_active_generation",
            TaskError::Superseded { .. } => "task_superseded",
            TaskError::Launch { .. } => "task_launch_failed",
            TaskError::PageOpen { .. } => "task_page_open_failed",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::PageClose { .. } => "task_page_close_failed",
            TaskError::Dropped => "task_dropped",
        }
    }

    /// Returns `true` if the caller was turned away before the task reached a generation.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TaskError::NoActiveGeneration | TaskError::Superseded { .. }
        )
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        TaskError::Fail {
            error: format!("{err:#}"),
        }
    }
}

/// # Errors returned by [`Coordinator::request_new_generation`](crate::Coordinator::request_new_generation).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The coordinator is not `Active` (fatally closed, shutting down or closed),
    /// or left `Active` before the requested generation became current.
    #[error("coordinator is not active")]
    NotActive,

    /// The requested generation failed to launch its browser.
    #[error("generation {generation} failed to launch: {error}")]
    Launch {
        /// Generation that failed.
        generation: GenerationId,
        /// The underlying error message.
        error: String,
    },
}

impl RequestError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RequestError::NotActive => "request_not_active",
            RequestError::Launch { .. } => "request_launch_failed",
        }
    }
}

/// # Browser lifecycle failure that fatally closed the coordinator.
///
/// Only the first failure is recorded; see
/// [`Coordinator::fatal_error`](crate::Coordinator::fatal_error).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
    /// Launching a generation's browser failed.
    #[error("generation {generation}: browser launch failed: {error}")]
    Launch {
        generation: GenerationId,
        error: String,
    },

    /// Closing a page after a task failed.
    #[error("generation {generation}: page close failed: {error}")]
    PageClose {
        generation: GenerationId,
        error: String,
    },

    /// Closing a generation's browser failed.
    #[error("generation {generation}: browser close failed: {error}")]
    BrowserClose {
        generation: GenerationId,
        error: String,
    },

    /// A collaborator panicked inside the generation runtime.
    #[error("generation {generation}: panicked: {info}")]
    Panicked { generation: GenerationId, info: String },
}

impl FatalError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FatalError::Launch { .. } => "fatal_launch",
            FatalError::PageClose { .. } => "fatal_page_close",
            FatalError::BrowserClose { .. } => "fatal_browser_close",
            FatalError::Panicked { .. } => "fatal_panicked",
        }
    }

    /// Generation in which the failure happened.
    pub fn generation(&self) -> GenerationId {
        match self {
            FatalError::Launch { generation, .. }
            | FatalError::PageClose { generation, .. }
            | FatalError::BrowserClose { generation, .. }
            | FatalError::Panicked { generation, .. } => *generation,
        }
    }
}

/// Renders a caught panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anyhow_errors_become_task_failures() {
        let err: TaskError = anyhow::anyhow!("inner").context("outer").into();
        assert_eq!(
            err,
            TaskError::Fail {
                error: "outer: inner".into()
            }
        );
    }

    #[test]
    fn page_close_keeps_work_failure() {
        let err = TaskError::PageClose {
            error: "socket gone".into(),
            task: Some(Box::new(TaskError::fail("boom"))),
        };
        assert_eq!(err.as_label(), "task_page_close_failed");
        assert_eq!(err.to_string(), "failed to close page: socket gone");
        assert!(!err.is_rejection());
        assert!(TaskError::NoActiveGeneration.is_rejection());
    }

    #[test]
    fn fatal_error_reports_generation() {
        let err = FatalError::BrowserClose {
            generation: GenerationId::new(3),
            error: "x".into(),
        };
        assert_eq!(err.generation(), GenerationId::new(3));
        assert_eq!(err.as_label(), "fatal_browser_close");
        assert_eq!(err.to_string(), "generation 3: browser close failed: x");
    }

    #[test]
    fn panic_payloads_are_rendered() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7_u8)), "unknown panic");
    }
}
