//! # Coordinator mailbox.
//!
//! Every change to coordinator state goes through one unbounded channel and is
//! applied by the sequencer loop, one command at a time:
//!
//! ```text
//! Coordinator handle ── Request / Shutdown ─────────────┐
//!                                                       ▼
//! Generation actors ── Launched / LaunchFailed ──► [mailbox] ──► Sequencer::handle()
//!                   ── Fatal / Closing / Closed ────────┘
//! ```
//!
//! `LaunchFailed` and `Fatal` carry an ack: the sender waits until the sequencer
//! has applied the failure before it lets anything else happen (for example
//! before delivering a task outcome), so a caller that saw the outcome also sees
//! the coordinator closed.

use tokio::sync::{mpsc, oneshot};

use crate::core::GenerationId;
use crate::error::{FatalError, RequestError};

pub(crate) type RequestReply = oneshot::Sender<Result<GenerationId, RequestError>>;

pub(crate) enum Command {
    /// `request_new_generation()`.
    Request { reply: RequestReply },
    /// `shutdown()`, or the last handle was dropped.
    Shutdown,
    /// Browser launched.
    Launched { generation: GenerationId },
    /// Browser launch failed.
    LaunchFailed {
        generation: GenerationId,
        error: String,
        ack: oneshot::Sender<()>,
    },
    /// Page close, browser close or a panic inside a generation.
    Fatal {
        cause: FatalError,
        ack: oneshot::Sender<()>,
    },
    /// Queue drained, browser close started.
    Closing { generation: GenerationId },
    /// Generation finished.
    Closed { generation: GenerationId, tasks: u64 },
}

/// Sending side of the coordinator mailbox.
#[derive(Clone)]
pub(crate) struct Mailbox {
    tx: mpsc::UnboundedSender<Command>,
}

impl Mailbox {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Fire-and-forget send. Dropped silently once the sequencer has exited.
    pub(crate) fn send(&self, cmd: Command) {
        let _ = self.tx.send(cmd);
    }

    /// Reports a launch failure and waits until it has been applied.
    pub(crate) async fn launch_failed(&self, generation: GenerationId, error: String) {
        let (ack, applied) = oneshot::channel();
        self.send(Command::LaunchFailed {
            generation,
            error,
            ack,
        });
        let _ = applied.await;
    }

    /// Reports a fatal failure and waits until it has been applied.
    pub(crate) async fn raise_fatal(&self, cause: FatalError) {
        let (ack, applied) = oneshot::channel();
        self.send(Command::Fatal { cause, ack });
        let _ = applied.await;
    }
}
