//! # Coordinator configuration.
//!
//! Provides [`Config`] centralized settings for one coordinator, passed to
//! [`CoordinatorBuilder::with_config`](crate::CoordinatorBuilder::with_config).
//!
//! There is no timeout setting: launches, tasks and closes run until they
//! settle, and `shutdown()` waits for them cooperatively.

/// Configuration for a coordinator.
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `queue_capacity`: per-generation task queue size (min 1)
///
/// All fields are public. Prefer the clamped accessors over reading them directly.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// The internal listener that feeds subscribers skips events it lagged behind on.
    pub bus_capacity: usize,

    /// Capacity of each generation's task queue.
    ///
    /// When the queue is full, `submit()` waits for room. A submission waiting
    /// for room when the generation is cut off fails with `TaskError::Superseded`.
    pub queue_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a task queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `queue_capacity = 1024`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            queue_capacity: 1024,
        }
    }
}
