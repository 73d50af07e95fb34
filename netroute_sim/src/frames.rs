//! Manually stepped frame scheduler with history.

use netroute_env::{FrameHandle, FrameQueue, FrameScheduler};

/// A `FrameScheduler` the harness fires by hand.
///
/// Records every request and cancellation so scenarios can replay a
/// superseded handle and check that it is ignored.
#[derive(Debug, Default)]
pub struct SimFrameScheduler {
    queue: FrameQueue,

    /// Every handle ever requested, in order
    requested: Vec<FrameHandle>,

    /// Every handle cancelled before firing
    cancelled: Vec<FrameHandle>,

    /// Number of handles fired via `next_due`
    fired: u64,
}

impl SimFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> &[FrameHandle] {
        &self.requested
    }

    pub fn cancelled(&self) -> &[FrameHandle] {
        &self.cancelled
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn pending_count(&self) -> usize {
        self.queue.pending_count()
    }
}

impl FrameScheduler for SimFrameScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = self.queue.request_frame();
        self.requested.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.queue.is_pending(handle) {
            self.cancelled.push(handle);
        }
        self.queue.cancel_frame(handle);
    }

    fn is_pending(&self, handle: FrameHandle) -> bool {
        self.queue.is_pending(handle)
    }

    fn next_due(&mut self) -> Option<FrameHandle> {
        let handle = self.queue.next_due()?;
        self.fired += 1;
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_recorded() {
        let mut frames = SimFrameScheduler::new();
        let a = frames.request_frame();
        let b = frames.request_frame();

        frames.cancel_frame(a);
        // Second cancel of the same handle is not recorded twice
        frames.cancel_frame(a);

        assert_eq!(frames.requested(), &[a, b]);
        assert_eq!(frames.cancelled(), &[a]);
        assert_eq!(frames.next_due(), Some(b));
        assert_eq!(frames.fired(), 1);
        assert_eq!(frames.pending_count(), 0);
    }
}
