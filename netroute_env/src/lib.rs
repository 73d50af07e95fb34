//! NetRoute Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the routing
//! engine to run against a real display clock (tokio) or a virtual clock
//! (the `netroute_sim` harness).
//!
//! # Core Concept: Injected Time and Frames
//!
//! The engine never reads the wall clock or schedules callbacks itself.
//! Everything that would normally be ambient is handed in:
//! - Time (`now()`, `sleep()`)
//! - Frame callbacks (`request_frame()`, `cancel_frame()`)
//! - Randomness (`rng()`)
//!
//! By deriving all entropy from a single 64-bit seed, any generated
//! topology becomes reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use netroute_env::{RouteContext, FrameScheduler, FrameQueue};
//!
//! async fn frame_loop<Ctx: RouteContext>(ctx: &Ctx, frames: &mut FrameQueue) {
//!     while let Some(handle) = frames.next_due() {
//!         ctx.sleep(Duration::from_millis(16)).await;
//!         tick(handle, ctx.now(), frames);
//!     }
//! }
//! ```

mod context;
mod scheduler;
mod types;
mod error;
mod tokio_impl;

pub use context::RouteContext;
pub use scheduler::{FrameHandle, FrameScheduler, FrameQueue};
pub use types::NodeId;
pub use error::EnvError;
pub use tokio_impl::TokioContext;
