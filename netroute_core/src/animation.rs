//! The packet animation clock.
//!
//! Maps elapsed time onto a position along a route. Every segment gets an
//! equal share of the total duration regardless of its length.
//!
//! The animator owns no timer. It asks an injected `FrameScheduler` for the
//! next frame and is ticked with that frame's handle and the current time.
//! A tick whose handle is not the one currently outstanding is stale and is
//! ignored, which is what makes a restart safe while an old callback is
//! still queued.
//!
//! ```text
//!            begin               elapsed >= duration
//!   Idle ──────────────► Running ────────────────────► Completed
//!    ▲                     │  ▲                            │
//!    └────── cancel ───────┘  └────────── begin ───────────┘
//! ```

use crate::graph::Position;
use crate::routing::PathSegment;
use netroute_env::{FrameHandle, FrameScheduler};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Animation timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Time to traverse the whole route (default: 2500ms)
    pub duration: Duration,

    /// Interval between frames when driven by a real clock (default: 16ms)
    pub frame_interval: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(2500),
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl AnimationConfig {
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationPhase {
    Idle,
    Running,
    Completed,
}

/// Where the packet is at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationFrame {
    /// Normalized time in [0, 1]
    pub progress: f64,

    /// Segment currently being traversed
    pub segment_index: usize,

    /// Fraction of that segment already covered, in [0, 1]
    pub segment_fraction: f64,

    /// Interpolated canvas position
    pub position: Position,
}

/// Result of delivering one frame callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Handle was superseded or the animator is not running
    Stale,

    /// Still moving; the next frame has been requested
    Progress(AnimationFrame),

    /// Arrived. Emitted exactly once per run
    Completed(AnimationFrame),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationError {
    #[error("Cannot animate an empty path")]
    EmptyPath,
}

/// Locates the packet on `path` at normalized `progress`.
///
/// Returns None for an empty path.
pub fn locate(path: &[PathSegment], progress: f64) -> Option<AnimationFrame> {
    if path.is_empty() {
        return None;
    }

    let progress = progress.clamp(0.0, 1.0);
    let segments = path.len();
    let scaled = progress * segments as f64;
    let segment_index = (scaled.floor() as usize).min(segments - 1);
    let segment_fraction = scaled - segment_index as f64;

    let segment = &path[segment_index];
    let position = Position::from(
        segment
            .from
            .position
            .coords
            .lerp(&segment.to.position.coords, segment_fraction),
    );

    Some(AnimationFrame {
        progress,
        segment_index,
        segment_fraction,
        position,
    })
}

/// Drives a single packet along a route.
#[derive(Debug)]
pub struct PacketAnimator {
    config: AnimationConfig,
    phase: AnimationPhase,
    path: Vec<PathSegment>,
    started_at: Duration,

    /// The only frame handle this run will accept
    pending: Option<FrameHandle>,

    /// Number of runs that reached Completed
    completions: u64,
}

impl PacketAnimator {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            phase: AnimationPhase::Idle,
            path: Vec::new(),
            started_at: Duration::ZERO,
            pending: None,
            completions: 0,
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == AnimationPhase::Running
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// The frame handle currently awaited, if running.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn completions(&self) -> u64 {
        self.completions
    }

    /// Normalized progress for a given elapsed time.
    pub fn progress_at(&self, elapsed: Duration) -> f64 {
        if self.config.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.config.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Position of the packet at `now` without advancing anything.
    pub fn frame_at(&self, now: Duration) -> Option<AnimationFrame> {
        match self.phase {
            AnimationPhase::Idle => None,
            AnimationPhase::Running => {
                locate(&self.path, self.progress_at(now.saturating_sub(self.started_at)))
            }
            AnimationPhase::Completed => locate(&self.path, 1.0),
        }
    }

    /// Starts a run, superseding any run in progress.
    ///
    /// The previous run's outstanding frame is cancelled, so a callback
    /// already queued for it will tick as `Stale`.
    pub fn begin<S: FrameScheduler + ?Sized>(
        &mut self,
        path: Vec<PathSegment>,
        now: Duration,
        scheduler: &mut S,
    ) -> Result<FrameHandle, AnimationError> {
        if path.is_empty() {
            return Err(AnimationError::EmptyPath);
        }

        if let Some(old) = self.pending.take() {
            debug!("Superseding running animation ({})", old);
            scheduler.cancel_frame(old);
        }

        let handle = scheduler.request_frame();
        debug!("Animation started: {} segments at {:?}", path.len(), now);

        self.path = path;
        self.started_at = now;
        self.phase = AnimationPhase::Running;
        self.pending = Some(handle);
        Ok(handle)
    }

    /// Delivers one frame callback.
    pub fn tick<S: FrameScheduler + ?Sized>(
        &mut self,
        handle: FrameHandle,
        now: Duration,
        scheduler: &mut S,
    ) -> TickOutcome {
        if self.phase != AnimationPhase::Running || self.pending != Some(handle) {
            trace!("Ignoring stale {}", handle);
            return TickOutcome::Stale;
        }
        self.pending = None;

        let elapsed = now.saturating_sub(self.started_at);
        if elapsed >= self.config.duration {
            self.phase = AnimationPhase::Completed;
            self.completions += 1;
            debug!("Animation completed after {:?}", elapsed);
            return match locate(&self.path, 1.0) {
                Some(frame) => TickOutcome::Completed(frame),
                None => TickOutcome::Stale,
            };
        }

        match locate(&self.path, self.progress_at(elapsed)) {
            Some(frame) => {
                self.pending = Some(scheduler.request_frame());
                TickOutcome::Progress(frame)
            }
            None => TickOutcome::Stale,
        }
    }

    /// Stops a running animation without completing it.
    ///
    /// Returns true if a run was cancelled.
    pub fn cancel<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        if self.phase != AnimationPhase::Running {
            return false;
        }
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
        }
        self.phase = AnimationPhase::Idle;
        self.path.clear();
        debug!("Animation cancelled");
        true
    }
}

impl Default for PacketAnimator {
    fn default() -> Self {
        Self::new(AnimationConfig::default())
    }
}
