//! # Identifiers and observable coordinator state.
//!
//! ```text
//! Status:           Active ──► FatallyClosed ──┐
//!                     │                        ▼
//!                     └──────────────────► ShuttingDown ──► Closed
//!
//! GenerationState:  Launching ──► Ready ──► Superseded ──► Closing ──► Closed
//!                       │                                               ▲
//!                       └──────────────── (launch failed) ──────────────┘
//! ```

use std::fmt;

/// Identifier of a browser generation. Starts at 0 and strictly increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationId(u64);

impl GenerationId {
    /// Wraps a raw generation number.
    pub const fn new(n: u64) -> Self {
        Self(n)
    }

    /// Returns the raw generation number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a submitted task, unique within one coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) const fn new(n: u64) -> Self {
        Self(n)
    }

    /// Returns the raw task number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Coordinator status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Accepting tasks and generation requests.
    Active,
    /// A browser lifecycle failure happened; nothing new is accepted.
    FatallyClosed,
    /// `shutdown()` was called; waiting for generations to close.
    ShuttingDown,
    /// Every generation is closed and internal workers are stopped.
    Closed,
}

impl Status {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::FatallyClosed => "fatally_closed",
            Status::ShuttingDown => "shutting_down",
            Status::Closed => "closed",
        }
    }
}

/// Lifecycle state of one generation, as seen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    /// Browser launch in flight. Tasks may already be queued.
    Launching,
    /// Browser up; tasks run one at a time.
    Ready,
    /// Queue cut off; already accepted tasks keep draining.
    Superseded,
    /// Queue drained; browser close in flight.
    Closing,
    /// Terminal.
    Closed,
}

/// Point-in-time view of one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationInfo {
    pub id: GenerationId,
    pub state: GenerationState,
    /// Number of tasks ever queued on the generation, aborted ones included;
    /// known once it is closed.
    pub tasks: Option<u64>,
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub status: Status,
    /// Generation that new submissions are bound to.
    pub current: Option<GenerationId>,
    /// Every generation ever created, oldest first.
    pub generations: Vec<GenerationInfo>,
}

impl Snapshot {
    pub(crate) fn new() -> Self {
        Self {
            status: Status::Active,
            current: None,
            generations: Vec::new(),
        }
    }

    /// Looks up one generation.
    pub fn generation(&self, id: GenerationId) -> Option<&GenerationInfo> {
        self.generations.iter().find(|g| g.id == id)
    }

    /// Returns `true` when every generation has reached [`GenerationState::Closed`].
    pub fn all_closed(&self) -> bool {
        self.generations
            .iter()
            .all(|g| g.state == GenerationState::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_lookup_and_closure() {
        let mut snap = Snapshot::new();
        assert!(snap.all_closed());

        snap.generations.push(GenerationInfo {
            id: GenerationId::new(0),
            state: GenerationState::Closed,
            tasks: Some(2),
        });
        snap.generations.push(GenerationInfo {
            id: GenerationId::new(1),
            state: GenerationState::Ready,
            tasks: None,
        });

        assert!(!snap.all_closed());
        assert_eq!(
            snap.generation(GenerationId::new(0)).and_then(|g| g.tasks),
            Some(2)
        );
        assert!(snap.generation(GenerationId::new(7)).is_none());
    }
}
