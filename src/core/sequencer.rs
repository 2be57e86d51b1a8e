//! # Sequencer: the coordinator's state machine.
//!
//! A single Tokio task owns every piece of mutable coordinator state and applies
//! [`Command`]s from the mailbox one at a time.
//!
//! ## Architecture
//! ```text
//! Command ──► Sequencer::handle()
//!   ├─► Request     ──► Active? start_generation(N+1), supersede current,
//!   │                   current = N+1, park reply : NotActive
//!   ├─► Launched    ──► Ready ──► resolve parked replies up to N
//!   ├─► LaunchFailed──► reply Launch error ──► raise_fatal
//!   ├─► Fatal       ──► raise_fatal: first cause wins, cut_all()
//!   ├─► Shutdown    ──► ShuttingDown, cut_all()
//!   ├─► Closing     ──► state = Closing
//!   └─► Closed      ──► state = Closed, keep task count
//!
//!   after each command: publish snapshot ──► flush replies and acks
//!   ShuttingDown && every generation Closed ──► finish()
//! ```
//!
//! ## Rules
//! - Generation ids are allocated here and strictly increase from 0.
//! - The current pointer is `None` whenever the status is not `Active`.
//! - Replies and acks are released **after** the snapshot and current pointer
//!   are updated, so an awaiting caller never observes stale state.
//! - A generation is current from the moment it is created, while it is still
//!   launching; tasks submitted meanwhile queue until its browser is ready.
//! - A request supersedes the previous current generation at once: it accepts
//!   no further tasks and drains in the background.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::browser::{Browser, Launcher};
use crate::core::generation::{GenerationActor, GenerationHandle};
use crate::core::listener::Listener;
use crate::core::mailbox::{Command, Mailbox, RequestReply};
use crate::core::{Config, GenerationId, GenerationInfo, GenerationState, Snapshot, Status};
use crate::error::{FatalError, RequestError};
use crate::events::{Bus, Event, EventKind};

/// Read side of the sequencer state, held by coordinator handles.
pub(crate) struct Observers<B: Browser> {
    pub(crate) current: watch::Receiver<Option<GenerationHandle<B>>>,
    pub(crate) snapshot: watch::Receiver<Snapshot>,
    pub(crate) fatal: Arc<OnceLock<FatalError>>,
}

/// Coordinator-side record of one generation.
struct Slot<B: Browser> {
    state: GenerationState,
    handle: Option<GenerationHandle<B>>,
    cutoff: CancellationToken,
    waiters: Vec<RequestReply>,
    tasks: Option<u64>,
}

impl<B: Browser> Slot<B> {
    /// Still accepting tasks.
    fn is_live(&self) -> bool {
        !self.cutoff.is_cancelled() && self.state != GenerationState::Closed
    }
}

pub(crate) struct Sequencer<L: Launcher> {
    launcher: Arc<L>,
    queue_capacity: usize,
    bus: Bus,
    mailbox: Mailbox,
    inbox: mpsc::UnboundedReceiver<Command>,
    listener: Option<Listener>,

    slots: BTreeMap<GenerationId, Slot<L::Browser>>,
    next_id: u64,
    status: Status,
    current: Option<GenerationId>,

    current_tx: watch::Sender<Option<GenerationHandle<L::Browser>>>,
    snapshot_tx: watch::Sender<Snapshot>,
    fatal: Arc<OnceLock<FatalError>>,

    replies: Vec<(RequestReply, Result<GenerationId, RequestError>)>,
}

impl<L: Launcher> Sequencer<L> {
    /// Starts generation 0, makes it current and spawns the sequencer loop.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn start(
        launcher: Arc<L>,
        cfg: &Config,
        bus: Bus,
        mailbox: Mailbox,
        inbox: mpsc::UnboundedReceiver<Command>,
        listener: Listener,
    ) -> Observers<L::Browser> {
        let (current_tx, current) = watch::channel(None);
        let (snapshot_tx, snapshot) = watch::channel(Snapshot::new());
        let fatal = Arc::new(OnceLock::new());

        let mut seq = Self {
            launcher,
            queue_capacity: cfg.queue_capacity_clamped(),
            bus,
            mailbox,
            inbox,
            listener: Some(listener),
            slots: BTreeMap::new(),
            next_id: 0,
            status: Status::Active,
            current: None,
            current_tx,
            snapshot_tx,
            fatal: Arc::clone(&fatal),
            replies: Vec::new(),
        };

        let first = seq.start_generation();
        seq.set_current(first);
        seq.publish_snapshot();
        tokio::spawn(seq.run());

        Observers {
            current,
            snapshot,
            fatal,
        }
    }

    async fn run(mut self) {
        while let Some(cmd) = self.inbox.recv().await {
            self.handle(cmd);
            if self.status == Status::ShuttingDown && self.all_closed() {
                break;
            }
        }
        self.finish().await;
    }

    fn handle(&mut self, cmd: Command) {
        let ack = match cmd {
            Command::Request { reply } => {
                if self.status == Status::Active {
                    let previous = self.current;
                    let id = self.start_generation();
                    if let Some(slot) = self.slots.get_mut(&id) {
                        slot.waiters.push(reply);
                    }
                    if let Some(previous) = previous {
                        self.supersede(previous);
                    }
                    self.set_current(id);
                } else {
                    self.replies.push((reply, Err(RequestError::NotActive)));
                }
                None
            }
            Command::Shutdown => {
                self.begin_shutdown();
                None
            }
            Command::Launched { generation } => {
                self.on_launched(generation);
                None
            }
            Command::LaunchFailed {
                generation,
                error,
                ack,
            } => {
                let waiters = self
                    .slots
                    .get_mut(&generation)
                    .map(|slot| std::mem::take(&mut slot.waiters))
                    .unwrap_or_default();
                for reply in waiters {
                    let err = RequestError::Launch {
                        generation,
                        error: error.clone(),
                    };
                    self.replies.push((reply, Err(err)));
                }
                self.raise_fatal(FatalError::Launch { generation, error });
                Some(ack)
            }
            Command::Fatal { cause, ack } => {
                self.raise_fatal(cause);
                Some(ack)
            }
            Command::Closing { generation } => {
                if let Some(slot) = self.slots.get_mut(&generation) {
                    slot.state = GenerationState::Closing;
                }
                None
            }
            Command::Closed { generation, tasks } => {
                self.on_closed(generation, tasks);
                None
            }
        };

        self.publish_snapshot();
        for (reply, result) in self.replies.drain(..) {
            let _ = reply.send(result);
        }
        if let Some(ack) = ack {
            let _ = ack.send(());
        }
    }

    fn start_generation(&mut self) -> GenerationId {
        let id = GenerationId::new(self.next_id);
        self.next_id += 1;

        let cutoff = CancellationToken::new();
        let (actor, handle) = GenerationActor::new(
            id,
            Arc::clone(&self.launcher),
            self.queue_capacity,
            cutoff.clone(),
            self.mailbox.clone(),
            self.bus.clone(),
        );
        self.slots.insert(
            id,
            Slot {
                state: GenerationState::Launching,
                handle: Some(handle),
                cutoff,
                waiters: Vec::new(),
                tasks: None,
            },
        );
        tokio::spawn(actor.run());
        id
    }

    fn on_launched(&mut self, generation: GenerationId) {
        let Some(slot) = self.slots.get_mut(&generation) else {
            return;
        };
        if slot.cutoff.is_cancelled() {
            slot.state = GenerationState::Superseded;
            return;
        }
        slot.state = GenerationState::Ready;
        if self.current == Some(generation) {
            self.fulfil(generation);
        }
    }

    /// Resolves every request parked on `generation` or an older one that was
    /// superseded before it got ready.
    fn fulfil(&mut self, generation: GenerationId) {
        let waiters: Vec<RequestReply> = self
            .slots
            .range_mut(..=generation)
            .flat_map(|(_, slot)| std::mem::take(&mut slot.waiters))
            .collect();
        for reply in waiters {
            self.replies.push((reply, Ok(generation)));
        }
    }

    fn set_current(&mut self, generation: GenerationId) {
        let handle = self
            .slots
            .get(&generation)
            .and_then(|slot| slot.handle.clone());
        self.current = handle.as_ref().map(GenerationHandle::id);
        self.current_tx.send_replace(handle);
    }

    fn clear_current(&mut self) {
        self.current = None;
        self.current_tx.send_replace(None);
    }

    /// Cuts off the queue of one generation; queued tasks keep draining.
    fn supersede(&mut self, generation: GenerationId) {
        let Some(slot) = self.slots.get_mut(&generation) else {
            return;
        };
        self.bus.publish(
            Event::new(EventKind::GenerationSuperseded).with_generation(generation),
        );
        slot.handle = None;
        if slot.state == GenerationState::Ready {
            slot.state = GenerationState::Superseded;
        }
        slot.cutoff.cancel();
    }

    /// Clears the current pointer, cuts off every live generation and rejects
    /// every parked request.
    fn cut_all(&mut self) {
        self.clear_current();

        let live: Vec<GenerationId> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.is_live())
            .map(|(id, _)| *id)
            .collect();
        for id in live {
            self.supersede(id);
        }

        let waiters: Vec<RequestReply> = self
            .slots
            .values_mut()
            .flat_map(|slot| std::mem::take(&mut slot.waiters))
            .collect();
        for reply in waiters {
            self.replies.push((reply, Err(RequestError::NotActive)));
        }
    }

    fn raise_fatal(&mut self, cause: FatalError) {
        let generation = cause.generation();
        let reason = cause.to_string();

        if self.fatal.set(cause).is_err() {
            self.bus.publish(
                Event::new(EventKind::FatalSuppressed)
                    .with_generation(generation)
                    .with_reason(reason),
            );
            return;
        }

        self.bus.publish(
            Event::new(EventKind::FatalRaised)
                .with_generation(generation)
                .with_reason(reason),
        );
        if self.status == Status::Active {
            self.status = Status::FatallyClosed;
        }
        self.cut_all();
    }

    fn begin_shutdown(&mut self) {
        if matches!(self.status, Status::ShuttingDown | Status::Closed) {
            return;
        }
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested));
        self.status = Status::ShuttingDown;
        self.cut_all();
    }

    fn on_closed(&mut self, generation: GenerationId, tasks: u64) {
        let Some(slot) = self.slots.get_mut(&generation) else {
            return;
        };
        slot.state = GenerationState::Closed;
        slot.tasks = Some(tasks);
        slot.handle = None;
        let leftover = std::mem::take(&mut slot.waiters);
        for reply in leftover {
            self.replies.push((reply, Err(RequestError::NotActive)));
        }
        if self.current == Some(generation) {
            self.clear_current();
        }
    }

    fn all_closed(&self) -> bool {
        self.slots
            .values()
            .all(|slot| slot.state == GenerationState::Closed)
    }

    fn publish_snapshot(&self) {
        let generations = self
            .slots
            .iter()
            .map(|(id, slot)| GenerationInfo {
                id: *id,
                state: slot.state,
                tasks: slot.tasks,
            })
            .collect();
        self.snapshot_tx.send_replace(Snapshot {
            status: self.status,
            current: self.current,
            generations,
        });
    }

    /// Every generation is closed: flush events, stop subscribers, report `Closed`.
    async fn finish(mut self) {
        self.bus
            .publish(Event::new(EventKind::CoordinatorClosed));
        if let Some(listener) = self.listener.take() {
            listener.stop().await;
        }

        self.status = Status::Closed;
        self.clear_current();
        self.publish_snapshot();
    }
}
