//! Background release pool for large evicted physical ranges.
//!
//! Dropping a multi-megabyte [`crate::physical_range::PhysicalRange`] means
//! deallocating its backing buffers, which can take long enough to matter
//! while the cache's exclusive lock is held. The release pool moves that
//! deallocation onto a worker thread via a `crossbeam-channel`, the same
//! bounded-channel background-work shape the teacher uses for its own
//! off-critical-path maintenance work. Disabling the pool (not constructing
//! one) only changes where the drop happens, never whether eviction
//! succeeds.

use crossbeam_channel::{bounded, Sender};
use tracing::trace;

use crate::physical_range::PhysicalRange;

const QUEUE_CAPACITY: usize = 256;

/// Owns a worker thread that drops evicted ranges off the caller's stack.
pub struct ReleasePool {
    sender: Sender<Box<dyn PhysicalRange + Send>>,
}

impl ReleasePool {
    /// Spawns the worker thread and returns a handle to submit work to it.
    #[must_use]
    pub fn spawn() -> Self {
        let (sender, receiver) = bounded::<Box<dyn PhysicalRange + Send>>(QUEUE_CAPACITY);
        std::thread::Builder::new()
            .name("lorc-release".into())
            .spawn(move || {
                for range in receiver {
                    let byte_size = range.byte_size();
                    drop(range);
                    trace!(byte_size, "released evicted range in background");
                }
            })
            .expect("failed to spawn lorc-release worker thread");
        Self { sender }
    }

    /// Hands `range` to the worker thread for deallocation.
    ///
    /// If the queue is full or the worker has shut down, `range` is dropped
    /// inline on the caller instead — correctness never depends on this
    /// path succeeding.
    pub fn release(&self, range: Box<dyn PhysicalRange + Send>) {
        if let Err(err) = self.sender.try_send(range) {
            drop(err.into_inner());
        }
    }
}
