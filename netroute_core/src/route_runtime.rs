//! Route Runtime - Drives a `RouteSession` from an environment context.
//!
//! This module is the integration layer between the pure engine
//! (generator, solver, animator) and the environment abstraction
//! (`RouteContext` for time and seeds, `FrameQueue` for callbacks).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      RouteRuntime                           │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │              Context: RouteContext                   │   │
//! │  │  • now() → animation clock                           │   │
//! │  │  • sleep() → frame pacing                            │   │
//! │  │  • rng() → topology generation                       │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                              │                               │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌──────────┐  │
//! │  │  TOPOLOGY  │ │  ROUTING   │ │ ANIMATION  │ │  FRAMES  │  │
//! │  │ Generator  │ │  Dijkstra  │ │   Clock    │ │  Queue   │  │
//! │  └────────────┘ └────────────┘ └────────────┘ └──────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use netroute_core::route_runtime::RouteRuntime;
//! use netroute_env::TokioContext;
//!
//! let mut runtime = RouteRuntime::new(TokioContext::shared(), RouteSession::default());
//! runtime.select("A", "F")?;
//! runtime.send_packet()?;
//! runtime.deliver(|frame| render(frame)).await?;
//! ```

use crate::animation::{AnimationFrame, TickOutcome};
use crate::graph::Graph;
use crate::session::{RouteError, RouteSession};
use netroute_env::{EnvError, FrameQueue, FrameScheduler, NodeId, RouteContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Owns a session plus the frame queue it schedules on.
///
/// Generic over the context, allowing the same runtime to run against
/// tokio time or a virtual simulation clock.
pub struct RouteRuntime<Ctx>
where
    Ctx: RouteContext,
{
    /// Environment context
    pub context: Arc<Ctx>,

    /// Engine state
    session: RouteSession,

    /// Outstanding frame callbacks
    frames: FrameQueue,

    /// Number of regenerations so far (seed extension for the next one)
    generation: u64,
}

impl<Ctx> RouteRuntime<Ctx>
where
    Ctx: RouteContext,
{
    /// Creates a runtime around an existing session.
    pub fn new(context: Arc<Ctx>, session: RouteSession) -> Self {
        Self {
            context,
            session,
            frames: FrameQueue::new(),
            generation: 0,
        }
    }

    pub fn session(&self) -> &RouteSession {
        &self.session
    }

    pub fn graph(&self) -> &Graph {
        self.session.graph()
    }

    pub fn frames(&self) -> &FrameQueue {
        &self.frames
    }

    /// Number of regenerations so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the topology using the context's seeded randomness.
    pub fn regenerate(&mut self, node_count: Option<usize>) -> &Graph {
        let mut rng = self.context.rng(self.generation);
        self.generation += 1;
        debug!("Regeneration #{} (seed={})", self.generation, self.context.seed());
        self.session.regenerate(&mut rng, node_count, &mut self.frames)
    }

    /// Selects both endpoints at once.
    pub fn select(&mut self, source: impl Into<NodeId>, destination: impl Into<NodeId>) -> Result<(), RouteError> {
        self.session.select_source(Some(source.into()))?;
        self.session.select_destination(Some(destination.into()))
    }

    /// Routes and starts animating at the context's current time.
    pub fn send_packet(&mut self) -> Result<u64, RouteError> {
        let now = self.context.now();
        self.session.send_packet(now, &mut self.frames)
    }

    pub fn cancel(&mut self) -> bool {
        self.session.cancel(&mut self.frames)
    }

    /// Fires the next due frame, if any, at the context's current time.
    pub fn step(&mut self) -> Option<TickOutcome> {
        let handle = self.frames.next_due()?;
        let now = self.context.now();
        Some(self.session.tick(handle, now, &mut self.frames))
    }

    /// Runs frames until the packet arrives, pacing them with the
    /// context's sleep. `on_frame` sees every emitted frame, the final one
    /// included.
    ///
    /// # Errors
    /// * `EnvError::SchedulerError` - no packet is in flight
    /// * `EnvError::Timeout` - the run overshot its frame budget
    pub async fn deliver<F>(&mut self, mut on_frame: F) -> Result<AnimationFrame, EnvError>
    where
        F: FnMut(&AnimationFrame),
    {
        let config = *self.session.animator().config();
        let interval = config.frame_interval.max(Duration::from_millis(1));
        let budget = frame_budget(config.duration, interval);

        for _ in 0..budget {
            if self.frames.pending_count() == 0 {
                return Err(EnvError::scheduler("no packet in flight"));
            }
            self.context.sleep(interval).await;

            match self.step() {
                Some(TickOutcome::Progress(frame)) => on_frame(&frame),
                Some(TickOutcome::Completed(frame)) => {
                    on_frame(&frame);
                    return Ok(frame);
                }
                Some(TickOutcome::Stale) | None => {}
            }
        }

        Err(EnvError::Timeout(config.duration.as_millis() as u64))
    }
}

/// Frames a run may take before it is considered stuck: four times the
/// nominal count plus slack for scheduler jitter.
fn frame_budget(duration: Duration, interval: Duration) -> u64 {
    let nominal = duration.as_nanos() / interval.as_nanos().max(1);
    (nominal as u64).saturating_mul(4).saturating_add(16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationConfig;
    use crate::topology::TopologyConfig;
    use netroute_env::TokioContext;

    fn fast_session() -> RouteSession {
        RouteSession::new(
            TopologyConfig::default(),
            AnimationConfig::default()
                .with_duration(Duration::from_millis(80))
                .with_frame_interval(Duration::from_millis(5)),
        )
    }

    #[test]
    fn test_frame_budget() {
        assert_eq!(frame_budget(Duration::from_millis(2500), Duration::from_millis(16)), 156 * 4 + 16);
        assert_eq!(frame_budget(Duration::ZERO, Duration::from_millis(16)), 16);
    }

    #[tokio::test]
    async fn test_deliver_with_tokio_clock() {
        let mut runtime = RouteRuntime::new(TokioContext::shared(), fast_session());
        runtime.select("A", "F").unwrap();
        assert_eq!(runtime.send_packet(), Ok(18));

        let mut seen = 0;
        let last = runtime.deliver(|_| seen += 1).await.unwrap();

        assert!(seen >= 1);
        assert_eq!(last.progress, 1.0);
        assert_eq!(last.segment_index, 2);
        assert!(runtime.session().state().delivered);
    }

    #[tokio::test]
    async fn test_deliver_without_packet_fails() {
        let mut runtime = RouteRuntime::new(TokioContext::shared(), fast_session());
        let result = runtime.deliver(|_| {}).await;
        assert!(matches!(result, Err(EnvError::SchedulerError(_))));
    }

    #[test]
    fn test_regenerate_advances_generation() {
        let mut runtime = RouteRuntime::new(TokioContext::shared(), fast_session());
        assert_eq!(runtime.graph().node_count(), 6);

        runtime.regenerate(Some(5));
        assert_eq!(runtime.graph().node_count(), 5);
        assert_eq!(runtime.generation(), 1);
    }
}
