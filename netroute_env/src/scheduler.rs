//! Frame scheduling abstraction.
//!
//! A display driver calls back once per refresh. The engine only ever asks
//! for "the next frame" and may withdraw that request; it never owns a
//! timer. Handles are never reused, so a callback carrying an old handle
//! can always be recognised as stale.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Opaque identifier of one requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

impl std::fmt::Display for FrameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// Abstraction for the per-frame callback primitive.
///
/// # Implementations
///
/// - **Production**: `FrameQueue`, drained by an async loop that sleeps one
///   frame interval between callbacks
/// - **Simulation**: `SimFrameScheduler`, which also records history so
///   tests can replay stale handles
pub trait FrameScheduler {
    /// Requests a callback on the next frame.
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraws a previously requested callback.
    ///
    /// Cancelling a handle that already fired or was never issued is a no-op.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Returns true if `handle` was requested and has neither fired nor
    /// been cancelled.
    fn is_pending(&self, handle: FrameHandle) -> bool;

    /// Removes and returns the next callback that is due to fire.
    fn next_due(&mut self) -> Option<FrameHandle>;
}

/// FIFO of outstanding frame requests.
#[derive(Debug, Default)]
pub struct FrameQueue {
    /// Next handle id to hand out
    next_id: u64,

    /// Outstanding requests in firing order
    pending: VecDeque<FrameHandle>,
}

impl FrameQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding requests.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Total number of handles ever issued.
    pub fn issued(&self) -> u64 {
        self.next_id
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.pending.push_back(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|h| *h != handle);
    }

    fn is_pending(&self, handle: FrameHandle) -> bool {
        self.pending.contains(&handle)
    }

    fn next_due(&mut self) -> Option<FrameHandle> {
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique() {
        let mut queue = FrameQueue::new();
        let a = queue.request_frame();
        let b = queue.request_frame();

        assert_ne!(a, b);
        assert_eq!(queue.issued(), 2);
        assert_eq!(queue.pending_count(), 2);
    }

    #[test]
    fn test_cancel_removes_pending() {
        let mut queue = FrameQueue::new();
        let a = queue.request_frame();
        let b = queue.request_frame();

        queue.cancel_frame(a);

        assert!(!queue.is_pending(a));
        assert!(queue.is_pending(b));
        assert_eq!(queue.next_due(), Some(b));
        assert_eq!(queue.next_due(), None);
    }

    #[test]
    fn test_fired_handle_is_not_pending() {
        let mut queue = FrameQueue::new();
        let a = queue.request_frame();

        assert_eq!(queue.next_due(), Some(a));
        assert!(!queue.is_pending(a));

        // Cancelling after firing is harmless
        queue.cancel_frame(a);
        assert_eq!(queue.pending_count(), 0);
    }
}
